use std::sync::Arc;

use crate::decode::decode_page;
use crate::fetch::Fetcher;
use crate::types::RenderError;

/// One shared, stateful page-rendering surface.
///
/// Implementations hold a single document at a time, so navigations must be
/// strictly sequential: navigate, then await completions until satisfied,
/// then navigate again. Script-heavy pages may fire more than one completion
/// per navigation.
#[async_trait::async_trait]
pub trait PageRenderer: Send {
    /// Begin loading `url`, replacing the current document.
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Wait for the next load/script-complete signal and return the
    /// document's HTML as of that moment.
    async fn await_completion(&mut self) -> Result<String, RenderError>;
}

/// Plain-HTTP stand-in for a script-executing surface: each navigation is one
/// GET and each completion is its body, once.
///
/// Good enough when the gateway serves the signed link without client-side
/// scripting. Callers pairing the resolution loop with this backend should
/// bound idle completions at one, since there is never a second signal.
pub struct HttpRenderer {
    fetcher: Arc<dyn Fetcher>,
    current: Option<String>,
}

impl HttpRenderer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            current: None,
        }
    }
}

#[async_trait::async_trait]
impl PageRenderer for HttpRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let page = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|err| RenderError::Navigation(err.to_string()))?;
        self.current = Some(decode_page(&page.bytes, page.content_type.as_deref()));
        Ok(())
    }

    async fn await_completion(&mut self) -> Result<String, RenderError> {
        self.current.take().ok_or(RenderError::Closed)
    }
}
