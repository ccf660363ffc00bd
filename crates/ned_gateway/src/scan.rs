use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use lol_html::{doc_text, element, EndTagHandler, HtmlRewriter, Settings};

use crate::types::{LinkCandidate, ScanOutput};

/// Finite state for one document pass.
///
/// The gateway's layout gives text nodes meaning only by position: whichever
/// tag opened last decides what the next text node is. That association is
/// fragile by design and tied to the exact page layout observed in the wild;
/// do not replace it with a structural (nesting-based) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParseState {
    #[default]
    Default,
    /// Next text node is the page title; `Object moved` signals a redirect.
    ExpectingTitle,
    /// Next text node names the candidate stashed from the last `onclick`.
    ExpectingName,
    /// Next text node describes the products linked a couple of rows later.
    RowDescription,
    /// Redirect title seen; the next plain `href` is the replay target.
    RetryDetected,
}

#[derive(Debug, Default)]
struct PendingCandidate {
    placeholder: Option<String>,
    category: String,
    name: String,
}

#[derive(Debug, Default)]
struct ScanState {
    state: ParseState,
    pending: PendingCandidate,
    row_description: String,
    row_seen: bool,
    redirect_target: Option<String>,
    candidates: Vec<LinkCandidate>,
    discarded: usize,
}

impl ScanState {
    fn open_title(&mut self) {
        self.state = ParseState::ExpectingTitle;
    }

    fn open_tr(&mut self) {
        self.row_seen = true;
        self.state = ParseState::RowDescription;
    }

    fn open_anchor(&mut self, onclick: Option<String>, href: Option<String>) {
        if let Some(value) = onclick {
            // The gateway triggers downloads from script, not from href.
            self.pending.placeholder = Some(value);
            self.pending.category = self.row_description.clone();
            self.state = ParseState::ExpectingName;
        } else if let Some(value) = href {
            if self.state == ParseState::RetryDetected {
                self.redirect_target = Some(value);
            }
        }
    }

    fn close_anchor(&mut self) {
        if self.pending.placeholder.is_none() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let Some(placeholder) = pending.placeholder else {
            return;
        };
        if !self.row_seen {
            // A category is only meaningful once a row boundary has been
            // observed; anything earlier is malformed and dropped.
            self.discarded += 1;
            return;
        }
        self.candidates.push(LinkCandidate {
            placeholder,
            category: pending.category,
            name: pending.name,
        });
    }

    fn text(&mut self, data: &str) {
        match self.state {
            ParseState::ExpectingName => {
                self.pending.name = data.trim().to_string();
                self.state = ParseState::Default;
            }
            ParseState::RowDescription => {
                self.row_description = data.to_string();
                self.state = ParseState::Default;
            }
            ParseState::ExpectingTitle => {
                if data == "Object moved" {
                    self.state = ParseState::RetryDetected;
                } else {
                    self.state = ParseState::Default;
                }
            }
            ParseState::Default | ParseState::RetryDetected => {}
        }
    }
}

/// Single pass over one normalized gateway document.
///
/// Never fails outright on malformed input: whatever the streaming parser
/// managed to see before an error is returned, and candidates that violate
/// the row invariant are silently dropped. Fewer results than expected is the
/// accepted failure mode here, not a crash.
pub fn scan_results_page(html: &str) -> ScanOutput {
    let state = Rc::new(RefCell::new(ScanState::default()));
    let text_buffer = Rc::new(RefCell::new(String::new()));

    let on_title = Rc::clone(&state);
    let on_tr = Rc::clone(&state);
    let on_anchor = Rc::clone(&state);
    let on_text = Rc::clone(&state);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("title", move |_el| {
                    on_title.borrow_mut().open_title();
                    Ok(())
                }),
                element!("tr", move |_el| {
                    on_tr.borrow_mut().open_tr();
                    Ok(())
                }),
                element!("a", move |el| {
                    on_anchor
                        .borrow_mut()
                        .open_anchor(el.get_attribute("onclick"), el.get_attribute("href"));
                    let on_close = Rc::clone(&on_anchor);
                    if let Some(handlers) = el.end_tag_handlers() {
                        let handler: EndTagHandler<'static> = Box::new(move |_end| {
                            on_close.borrow_mut().close_anchor();
                            Ok(())
                        });
                        handlers.push(handler);
                    }
                    Ok(())
                }),
            ],
            document_content_handlers: vec![doc_text!(move |chunk| {
                // Text nodes can arrive in several chunks; the state machine
                // wants one event per node, like the layout was reverse
                // engineered against.
                let mut buffer = text_buffer.borrow_mut();
                buffer.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    on_text.borrow_mut().text(&buffer);
                    buffer.clear();
                }
                Ok(())
            })],
            ..Settings::new()
        },
        |_: &[u8]| {},
    );

    let written = rewriter.write(html.as_bytes());
    let finished = written.and_then(|_| rewriter.end());
    if let Err(err) = finished {
        warn!("gateway page scan stopped early: {err}");
    }

    let mut state = state.borrow_mut();
    if state.discarded > 0 {
        debug!(
            "dropped {} candidate(s) seen before the first table row",
            state.discarded
        );
    }
    ScanOutput {
        candidates: std::mem::take(&mut state.candidates),
        redirect_target: state.redirect_target.take(),
    }
}
