//! A scripted environment that walks through a fixed list of pages.

use async_trait::async_trait;
use mimic_core::{Action, ActionKind, Clickable, Environment, InputField, Observation, Result};
use tracing::{debug, warn};

pub const END_URL: &str = "http://mock.com/end";
pub const END_CONTENT: &str = "End of mock pages";
pub const STEP_CAP_MESSAGE: &str = "Mock environment reached max steps";

/// Serves `pages` in order. Clicks, searches and typing advance to the next
/// page; every other action stays put. Once more than `max_steps` actions
/// have been applied, observations carry an error message.
pub struct MockEnvironment {
    pages: Vec<Observation>,
    max_steps: usize,
    step_count: usize,
    page_index: usize,
}

impl MockEnvironment {
    pub fn new(pages: Vec<Observation>, max_steps: usize) -> Self {
        Self {
            pages,
            max_steps,
            step_count: 0,
            page_index: 0,
        }
    }

    /// A small storefront flow: home, search results, a product page.
    pub fn demo(max_steps: usize) -> Self {
        Self::new(demo_pages(), max_steps)
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    fn current(&self) -> Observation {
        match self.pages.get(self.page_index) {
            Some(page) => {
                let mut page = page.clone();
                if page.url.is_empty() {
                    page.url = format!("http://mock.com/page{}", self.page_index);
                }
                page
            }
            None => Observation::page(END_URL, END_CONTENT),
        }
    }
}

#[async_trait]
impl Environment for MockEnvironment {
    fn name(&self) -> &str {
        "mock"
    }

    async fn reset(&mut self) -> Result<Observation> {
        self.step_count = 0;
        self.page_index = 0;
        Ok(self.current())
    }

    async fn step(&mut self, action: &Action) -> Result<Observation> {
        self.step_count += 1;
        if matches!(action.kind(), ActionKind::Click | ActionKind::Search | ActionKind::Type) {
            self.page_index += 1;
        }
        debug!(step = self.step_count, page = self.page_index, kind = %action.kind(), "mock step");

        let mut observation = self.current();
        if self.step_count > self.max_steps {
            warn!(max_steps = self.max_steps, "mock environment past its step cap");
            observation.error_message = Some(STEP_CAP_MESSAGE.to_string());
        }
        Ok(observation)
    }

    async fn observe(&mut self) -> Result<Observation> {
        Ok(self.current())
    }
}

/// Built-in pages used when no pages are configured.
pub fn demo_pages() -> Vec<Observation> {
    let search_box = InputField {
        id: "search".into(),
        input_type: "search".into(),
        placeholder: "Search products".into(),
        name: None,
    };
    vec![
        Observation::page(
            "http://mock.com/",
            "Welcome to Mock Mart. Deals on laptops, headphones and home goods.",
        )
        .with_clickables(vec![
            Clickable::new("nav-deals", "Today's deals"),
            Clickable::new("nav-electronics", "Electronics"),
        ])
        .with_inputs(vec![search_box.clone()]),
        Observation::page(
            "http://mock.com/search",
            "Results: refurbished laptop 14 inch $329; gaming laptop $1299; laptop sleeve $19",
        )
        .with_clickables(vec![
            Clickable::new("result-1", "Refurbished laptop 14 inch, $329"),
            Clickable::new("result-2", "Gaming laptop, $1299"),
            Clickable::new("result-3", "Laptop sleeve, $19"),
        ])
        .with_inputs(vec![search_box]),
        Observation::page(
            "http://mock.com/product/1",
            "Refurbished laptop 14 inch. 8GB RAM, 256GB SSD. $329. Free returns within 30 days.",
        )
        .with_clickables(vec![
            Clickable::new("add-to-cart", "Add to cart"),
            Clickable::new("reviews", "Customer reviews (212)"),
        ]),
    ]
}
