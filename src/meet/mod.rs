//! Meeting session adapter.
//!
//! Wraps browser automation behind a small surface: join, announce,
//! keep-alive, leave. The concrete adapter drives a Chromium instance
//! over CDP; the pre-join flow mirrors what a human does (fill the
//! display name, mute mic and camera, click join).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MeetingConfig;

#[async_trait]
pub trait MeetingSession: Send + Sync {
    /// Join the call and wait until we are in the meeting. Callers bound
    /// this with their own timeout.
    async fn join(&mut self, url: &str) -> Result<()>;

    /// Post a message to the meeting chat.
    async fn announce(&mut self, text: &str) -> Result<()>;

    /// Verify the session is still alive.
    async fn keep_alive(&mut self) -> Result<()>;

    /// Leave the call and release the browser.
    async fn leave(&mut self) -> Result<()>;
}

/// Chromium-backed meeting session.
pub struct ChromiumMeetSession {
    display_name: String,
    headless: bool,
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumMeetSession {
    pub fn from_config(config: &MeetingConfig) -> Self {
        Self {
            display_name: config.display_name.clone(),
            headless: config.headless,
            browser: None,
            page: None,
            handler_task: None,
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page.as_ref().context("Meeting session not started")
    }

    async fn handle_prejoin(&self, page: &Page) -> Result<()> {
        // Give the pre-join screen time to render.
        tokio::time::sleep(Duration::from_secs(2)).await;

        if let Ok(name_input) = page.find_element(r#"input[aria-label="Your name"]"#).await {
            name_input.click().await?;
            name_input.type_str(&self.display_name).await?;
            debug!("Filled display name");
        }

        // Mute mic and camera when the controls are present; joining
        // unmuted would leak the TTS audio before the first question.
        for selector in [
            r#"[aria-label*="Turn off microphone"]"#,
            r#"[aria-label*="Turn off camera"]"#,
        ] {
            if let Ok(button) = page.find_element(selector).await {
                let _ = button.click().await;
            }
        }

        let clicked = page
            .evaluate(
                r#"(() => {
                    const labels = ['Ask to join', 'Join now'];
                    const button = [...document.querySelectorAll('button')]
                        .find(b => labels.some(l => b.textContent.includes(l)));
                    if (button) { button.click(); return true; }
                    return false;
                })()"#,
            )
            .await?
            .into_value::<bool>()
            .unwrap_or(false);

        if !clicked {
            warn!("Join button not found yet; waiting for manual intervention");
        }

        Ok(())
    }
}

#[async_trait]
impl MeetingSession for ChromiumMeetSession {
    async fn join(&mut self, url: &str) -> Result<()> {
        let mut builder = BrowserConfig::builder().args(vec![
            "--use-fake-ui-for-media-stream",
            "--use-fake-device-for-media-stream",
        ]);
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(|e| anyhow!(e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chromium for the meeting session")?;

        // CDP messages must be pumped for the browser connection to work.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Navigating to meeting: {}", url);
        let page = browser
            .new_page(url)
            .await
            .context("Failed to open meeting page")?;

        self.handle_prejoin(&page).await?;

        // In the meeting once the pre-join controls are gone. Poll until
        // then; the caller's join timeout bounds this loop.
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let joined = page
                .evaluate("document.querySelector('button[aria-label*=\"Leave call\"]') !== null")
                .await?
                .into_value::<bool>()
                .unwrap_or(false);
            if joined {
                break;
            }
        }

        info!("Joined meeting");
        self.browser = Some(browser);
        self.page = Some(page);
        self.handler_task = Some(handler_task);
        Ok(())
    }

    async fn announce(&mut self, text: &str) -> Result<()> {
        let page = self.page()?;

        page.evaluate(
            r#"(() => {
                const chat = document.querySelector('button[aria-label*="Chat with everyone"]');
                if (chat) chat.click();
            })()"#,
        )
        .await?;
        tokio::time::sleep(Duration::from_millis(500)).await;

        let textbox = page
            .find_element(r#"textarea[aria-label="Send a message"], textarea[aria-label="Send a message to everyone"]"#)
            .await
            .context("Meeting chat input not found")?;
        textbox.click().await?;
        textbox.type_str(text).await?;
        textbox.press_key("Enter").await?;

        debug!("Posted chat announcement ({} chars)", text.len());
        Ok(())
    }

    async fn keep_alive(&mut self) -> Result<()> {
        self.page()?
            .evaluate("document.visibilityState")
            .await
            .context("Meeting page stopped responding")?;
        Ok(())
    }

    async fn leave(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            let _ = page
                .evaluate(
                    r#"(() => {
                        const leave = document.querySelector('button[aria-label*="Leave call"]');
                        if (leave) leave.click();
                    })()"#,
                )
                .await;
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close meeting browser cleanly: {}", e);
            }
            let _ = browser.wait().await;
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        info!("Left meeting");
        Ok(())
    }
}
