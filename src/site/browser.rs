//! WebDriver-backed implementation of [`SearchPage`].
//!
//! A [`NewsSite`] owns one browser session. It is created after a work item
//! validates and must be closed with [`NewsSite::close`] on every path; the
//! runner takes care of that.

use super::{PageError, SearchPage, SiteConfig};
use crate::validation::SearchRequest;
use std::path::Path;
use std::time::Duration;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

pub struct NewsSite {
    driver: WebDriver,
    config: SiteConfig,
}

impl NewsSite {
    /// Start a Chrome session on the WebDriver server at `webdriver_url`.
    #[instrument(level = "info", skip(config))]
    pub async fn launch(
        webdriver_url: &str,
        headless: bool,
        config: SiteConfig,
    ) -> Result<Self, PageError> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--window-size=1920,1080")?;

        let driver = WebDriver::new(webdriver_url, caps).await?;
        info!("Browser session started");
        Ok(Self { driver, config })
    }

    /// Search for the request's phrase, narrow to its category, newest first.
    #[instrument(level = "info", skip_all, fields(phrase = %request.phrase(), category = %request.category()))]
    pub async fn open_search(&self, request: &SearchRequest) -> Result<(), PageError> {
        let sel = &self.config.selectors;

        self.driver.goto(&self.config.base_url).await?;
        self.accept_cookies().await;

        self.driver
            .query(By::Css(sel.search_button.as_str()))
            .first()
            .await?
            .click()
            .await?;
        let input = self
            .driver
            .query(By::Css(sel.search_input.as_str()))
            .first()
            .await?;
        input.send_keys(request.phrase()).await?;
        self.driver
            .query(By::Css(sel.search_submit.as_str()))
            .first()
            .await?
            .click()
            .await?;
        info!("Submitted search");

        self.filter_category(request.category().label()).await?;
        self.sort_newest().await?;
        Ok(())
    }

    /// Save a PNG of the current viewport.
    pub async fn screenshot(&self, path: &Path) -> Result<(), PageError> {
        self.driver.screenshot(path).await?;
        Ok(())
    }

    /// End the browser session.
    pub async fn close(self) -> Result<(), PageError> {
        self.driver.quit().await?;
        info!("Browser session closed");
        Ok(())
    }

    async fn accept_cookies(&self) {
        let selector = self.config.selectors.cookie_consent.as_str();
        match self.driver.find_all(By::Css(selector)).await {
            Ok(buttons) => {
                if let Some(button) = buttons.first() {
                    if let Err(e) = button.click().await {
                        debug!(error = %e, "Cookie banner click failed");
                    } else {
                        debug!("Accepted cookie banner");
                    }
                }
            }
            Err(e) => debug!(error = %e, "No cookie banner"),
        }
    }

    async fn filter_category(&self, label: &str) -> Result<(), PageError> {
        let selector = self.config.selectors.category_option.as_str();
        self.driver.query(By::Css(selector)).first().await?;

        for option in self.driver.find_all(By::Css(selector)).await? {
            let text = option.text().await?;
            if text.trim().eq_ignore_ascii_case(label) {
                option.scroll_into_view().await?;
                option.click().await?;
                info!(category = label, "Applied category filter");
                self.settle().await;
                return Ok(());
            }
        }
        Err(PageError::CategoryUnavailable(label.to_string()))
    }

    async fn sort_newest(&self) -> Result<(), PageError> {
        let selector = self.config.selectors.sort_newest.as_str();
        let options = self.driver.find_all(By::Css(selector)).await?;
        let Some(newest) = options.first() else {
            warn!(selector, "Sort control not found; results keep the site's order");
            return Ok(());
        };
        newest.click().await?;
        info!("Sorted results newest first");
        self.settle().await;
        Ok(())
    }

    async fn settle(&self) {
        sleep(Duration::from_secs(self.config.settle_secs)).await;
    }
}

impl SearchPage for NewsSite {
    type Card = WebElement;

    async fn cards(&self) -> Result<Vec<WebElement>, PageError> {
        let cards = self
            .driver
            .find_all(By::Css(self.config.selectors.result_card.as_str()))
            .await?;
        debug!(count = cards.len(), "Found result cards");
        Ok(cards)
    }

    async fn card_text(&self, card: &WebElement) -> Result<String, PageError> {
        Ok(card.text().await?)
    }

    async fn image_src(&self, card: &WebElement) -> Result<Option<String>, PageError> {
        let images = card
            .find_all(By::Css(self.config.selectors.card_image.as_str()))
            .await?;
        match images.first() {
            Some(image) => Ok(image.prop("src").await?),
            None => Ok(None),
        }
    }

    async fn has_next_page(&self) -> Result<bool, PageError> {
        let links = self
            .driver
            .find_all(By::Css(self.config.selectors.next_page.as_str()))
            .await?;
        let Some(link) = links.first() else {
            return Ok(false);
        };
        if !link.is_enabled().await? {
            return Ok(false);
        }
        let aria_disabled = link.attr("aria-disabled").await?;
        let class = link.attr("class").await?.unwrap_or_default();
        Ok(aria_disabled.as_deref() != Some("true") && !class.contains("disabled"))
    }

    async fn next_page(&self) -> Result<(), PageError> {
        let selector = self.config.selectors.next_page.as_str();
        let links = self.driver.find_all(By::Css(selector)).await?;
        let link = links
            .first()
            .ok_or_else(|| PageError::MissingElement(selector.to_string()))?;
        link.scroll_into_view().await?;
        link.click().await?;
        debug!("Clicked next page");
        Ok(())
    }
}
