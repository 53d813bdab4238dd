//! Static HTML pages standing in for the live site in tests.
//!
//! Each page is a fragment like:
//!
//! ```html
//! <ul>
//!   <li class="card"><p>Jun 5, 2024</p><h3>Title</h3><img src="https://cdn.test/a.jpg"></li>
//! </ul>
//! <a class="next">Next</a>
//! ```
//!
//! Card text is the text of each `p`/`h3` in the card joined by newlines, the
//! way a browser renders block elements. A missing or `aria-disabled="true"`
//! `a.next` ends pagination.

use super::{PageError, SearchPage};
use scraper::{Html, Selector};
use std::cell::Cell;

#[derive(Debug, Clone)]
struct FixtureCard {
    text: String,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct FixturePage {
    cards: Vec<FixtureCard>,
    has_next: bool,
}

#[derive(Debug)]
pub struct FixtureSite {
    pages: Vec<FixturePage>,
    current: Cell<usize>,
    /// Image reads still to come back empty, emulating lazy rendering.
    blank_image_reads: Cell<u32>,
    /// Image reads still to fail outright, emulating a lost element.
    failing_image_reads: Cell<u32>,
    pub page_loads: Cell<u32>,
    pub next_clicks: Cell<u32>,
    pub image_reads: Cell<u32>,
}

impl FixtureSite {
    pub fn from_html(pages: &[&str]) -> Self {
        let card_sel = Selector::parse("li.card").unwrap();
        let line_sel = Selector::parse("p, h3").unwrap();
        let img_sel = Selector::parse("img").unwrap();
        let next_sel = Selector::parse("a.next").unwrap();

        let pages = pages
            .iter()
            .map(|html| {
                let document = Html::parse_fragment(html);
                let cards = document
                    .select(&card_sel)
                    .map(|card| FixtureCard {
                        text: card
                            .select(&line_sel)
                            .map(|line| line.text().collect::<String>().trim().to_string())
                            .collect::<Vec<_>>()
                            .join("\n"),
                        image: card
                            .select(&img_sel)
                            .next()
                            .and_then(|img| img.value().attr("src"))
                            .map(String::from),
                    })
                    .collect();
                let has_next = document
                    .select(&next_sel)
                    .next()
                    .is_some_and(|a| a.value().attr("aria-disabled") != Some("true"));
                FixturePage { cards, has_next }
            })
            .collect();

        Self {
            pages,
            current: Cell::new(0),
            blank_image_reads: Cell::new(0),
            failing_image_reads: Cell::new(0),
            page_loads: Cell::new(0),
            next_clicks: Cell::new(0),
            image_reads: Cell::new(0),
        }
    }

    /// Make the next `n` image reads return an empty `src`.
    pub fn with_blank_image_reads(self, n: u32) -> Self {
        self.blank_image_reads.set(n);
        self
    }

    /// Make the next `n` image reads fail with [`PageError::MissingElement`].
    pub fn with_failing_image_reads(self, n: u32) -> Self {
        self.failing_image_reads.set(n);
        self
    }

    fn page(&self) -> &FixturePage {
        &self.pages[self.current.get()]
    }
}

impl SearchPage for FixtureSite {
    type Card = usize;

    async fn cards(&self) -> Result<Vec<usize>, PageError> {
        self.page_loads.set(self.page_loads.get() + 1);
        Ok((0..self.page().cards.len()).collect())
    }

    async fn card_text(&self, card: &usize) -> Result<String, PageError> {
        Ok(self.page().cards[*card].text.clone())
    }

    async fn image_src(&self, card: &usize) -> Result<Option<String>, PageError> {
        self.image_reads.set(self.image_reads.get() + 1);
        let failing = self.failing_image_reads.get();
        if failing > 0 {
            self.failing_image_reads.set(failing - 1);
            return Err(PageError::MissingElement("img".into()));
        }
        let blank = self.blank_image_reads.get();
        if blank > 0 {
            self.blank_image_reads.set(blank - 1);
            return Ok(Some(String::new()));
        }
        Ok(self.page().cards[*card].image.clone())
    }

    async fn has_next_page(&self) -> Result<bool, PageError> {
        Ok(self.page().has_next)
    }

    async fn next_page(&self) -> Result<(), PageError> {
        if !self.page().has_next {
            return Err(PageError::MissingElement("a.next".into()));
        }
        self.next_clicks.set(self.next_clicks.get() + 1);
        self.current.set(self.current.get() + 1);
        Ok(())
    }
}
