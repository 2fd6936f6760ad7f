pub mod composer;
pub mod dialog;
pub mod feed;
pub mod stats;

use crate::feeds::Message;

/// Something that can show a message snapshot. Every call replaces whatever
/// was shown before.
pub trait FeedView {
    fn render(&mut self, messages: &[Message]);

    fn render_empty_state(&mut self);
}
