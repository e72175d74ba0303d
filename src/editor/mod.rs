//! Editor facade
//!
//! [`RichTextEditor`] ties the document, the formatting engine, the HTML
//! bridge and the renderers together behind the command surface a host view
//! drives: the host reports selection changes and keystrokes, forwards
//! toolbar actions by identifier, and asks for toolbar state, attachment
//! bounds and attachment images.

pub mod config;

pub use config::{EditorConfig, IconSet};

use crate::error::EditorError;
use crate::formatting::{self, ToolbarItem};
use crate::html::{from_html, to_html};
use crate::models::{Attachment, AttachmentId, FormattingIdentifier, MediaAttachment};
use crate::renderers::{
    AttachmentRenderer, CommentRenderer, DefaultRenderer, FontMetrics, HtmlRenderer, Image,
    ImageCallbacks, ImageFetcher, ImagePipeline, MediaRenderer, RenderRegistry, TaskSpawner,
};
use crate::text::{AttachmentEntry, Document, SelectionRange};
use crate::utils::{byte_offset, utf16_len};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Text inserted as the comment body by the `more` action
pub const MORE_TEXT: &str = "more";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditingMode {
    #[default]
    Rich,
    /// Raw HTML editing
    Source,
}

/// What the host persists when the user is done
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub title: String,
    pub html: String,
}

/// Result of a toolbar action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActionOutcome {
    /// The document changed
    Applied,
    /// Nothing to do in the current mode
    Ignored,
    ModeChanged { mode: EditingMode },
    /// The host should pick media and call [`RichTextEditor::insert_media`]
    MediaRequested,
    Done { snapshot: Snapshot },
}

pub struct RichTextEditor {
    config: EditorConfig,
    title: String,
    document: Document,
    selection: SelectionRange,
    mode: EditingMode,
    source: String,
    registry: RenderRegistry,
    pipeline: ImagePipeline,
}

impl RichTextEditor {
    /// Editor without network access or background work
    pub fn new(config: EditorConfig) -> Self {
        Self::with_services(config, None, None)
    }

    /// Editor that fetches remote images with `fetcher` on `spawner`
    pub fn with_services(
        config: EditorConfig,
        fetcher: Option<Arc<dyn ImageFetcher>>,
        spawner: Option<Arc<dyn TaskSpawner>>,
    ) -> Self {
        let registry = build_registry(&config, fetcher);
        let pipeline = ImagePipeline::new(spawner, config.missing_image);
        log::debug!(
            "Editor created (read-only: {}, title limit: {})",
            config.read_only,
            config.title_character_limit
        );
        Self {
            config,
            title: String::new(),
            document: Document::new(),
            selection: SelectionRange::default(),
            mode: EditingMode::Rich,
            source: String::new(),
            registry,
            pipeline,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> SelectionRange {
        self.selection
    }

    pub fn mode(&self) -> EditingMode {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.config.read_only = read_only;
    }

    fn ensure_writable(&self) -> Result<(), EditorError> {
        if self.config.read_only {
            return Err(EditorError::ReadOnly);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Title
    // ------------------------------------------------------------------

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the whole title; returns false if it would exceed the limit
    pub fn set_title(&mut self, title: &str) -> Result<bool, EditorError> {
        let range = SelectionRange::new(0, utf16_len(&self.title));
        self.replace_title(range, title)
    }

    /// Replace `range` (UTF-16) of the title with `replacement`
    ///
    /// The edit is rejected, leaving the title unchanged, when the resulting
    /// title is longer than the configured limit in characters.
    pub fn replace_title(&mut self, range: SelectionRange, replacement: &str) -> Result<bool, EditorError> {
        self.ensure_writable()?;
        let invalid = || EditorError::InvalidRange {
            start: range.start,
            length: range.length,
            len: utf16_len(&self.title),
        };
        let start = byte_offset(&self.title, range.start).ok_or_else(invalid)?;
        let end = byte_offset(&self.title, range.end()).ok_or_else(invalid)?;

        let removed = self.title[start..end].chars().count();
        let new_length = self.title.chars().count() + replacement.chars().count() - removed;
        if new_length > self.config.title_character_limit {
            log::debug!(
                "Title edit rejected: {} characters exceeds limit {}",
                new_length,
                self.config.title_character_limit
            );
            return Ok(false);
        }
        self.title.replace_range(start..end, replacement);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Current content as HTML; in source mode, the source being edited
    pub fn html(&self) -> String {
        match self.mode {
            EditingMode::Rich => to_html(&self.document),
            EditingMode::Source => self.source.clone(),
        }
    }

    /// Replace the content with `html`
    pub fn set_html(&mut self, html: &str) -> Result<(), EditorError> {
        self.ensure_writable()?;
        match self.mode {
            EditingMode::Rich => {
                self.load_document(from_html(html));
            }
            EditingMode::Source => {
                self.source = html.to_string();
                self.selection = SelectionRange::caret(utf16_len(&self.source));
            }
        }
        Ok(())
    }

    fn load_document(&mut self, document: Document) {
        self.document.clear();
        self.pipeline.reset();
        self.document = document;
        self.selection = SelectionRange::caret(self.document.len());
        self.document.selection_changed(self.selection);
    }

    /// Source text while in source mode
    pub fn source(&self) -> Option<&str> {
        match self.mode {
            EditingMode::Source => Some(&self.source),
            EditingMode::Rich => None,
        }
    }

    /// Host placeholder text, shown only while the body is empty
    pub fn placeholder(&self) -> Option<&str> {
        let empty = match self.mode {
            EditingMode::Rich => self.document.is_empty(),
            EditingMode::Source => self.source.is_empty(),
        };
        self.config.placeholder.as_deref().filter(|_| empty)
    }

    /// Record the host's selection
    pub fn set_selection(&mut self, selection: SelectionRange) -> Result<(), EditorError> {
        let len = self.content_len();
        if !selection.fits(len) {
            return Err(EditorError::InvalidRange {
                start: selection.start,
                length: selection.length,
                len,
            });
        }
        if self.mode == EditingMode::Rich {
            self.document.validate_range(selection)?;
            self.document.selection_changed(selection);
        }
        self.selection = selection;
        Ok(())
    }

    fn content_len(&self) -> usize {
        match self.mode {
            EditingMode::Rich => self.document.len(),
            EditingMode::Source => utf16_len(&self.source),
        }
    }

    /// Type `text` over the selection; the caret ends up after it
    pub fn insert_text(&mut self, text: &str) -> Result<(), EditorError> {
        self.ensure_writable()?;
        let range = self.selection;

        if self.mode == EditingMode::Source {
            self.replace_source(range, text)?;
            self.selection = SelectionRange::caret(range.start + utf16_len(text));
            return Ok(());
        }

        let remaining = self.document.len() - range.length;
        let removed = if range.is_caret() {
            self.document.insert_text(range.start, text)?;
            Vec::new()
        } else {
            self.document.replace(range, text)?
        };
        self.forget(removed);

        let inserted = self.document.len() - remaining;
        self.selection = SelectionRange::caret(range.start + inserted);
        Ok(())
    }

    /// Delete the selection, or the unit before a caret
    pub fn delete_backward(&mut self) -> Result<(), EditorError> {
        let range = self.selection;
        if !range.is_caret() {
            return self.delete(range);
        }
        if range.start == 0 {
            return Ok(());
        }
        let mut start = range.start - 1;
        // Step over a whole surrogate pair
        if self.validate_boundary(start).is_err() && start > 0 {
            start -= 1;
        }
        self.delete(SelectionRange::from_bounds(start, range.start))
    }

    fn validate_boundary(&self, index: usize) -> Result<(), EditorError> {
        match self.mode {
            EditingMode::Rich => self.document.validate_range(SelectionRange::caret(index)),
            EditingMode::Source => byte_offset(&self.source, index).map(|_| ()).ok_or(
                EditorError::InvalidRange {
                    start: index,
                    length: 0,
                    len: utf16_len(&self.source),
                },
            ),
        }
    }

    /// Delete `range`; the caret moves to its start
    pub fn delete(&mut self, range: SelectionRange) -> Result<(), EditorError> {
        self.ensure_writable()?;
        match self.mode {
            EditingMode::Rich => {
                let removed = self.document.delete(range)?;
                self.forget(removed);
            }
            EditingMode::Source => self.replace_source(range, "")?,
        }
        self.selection = SelectionRange::caret(range.start);
        Ok(())
    }

    fn replace_source(&mut self, range: SelectionRange, text: &str) -> Result<(), EditorError> {
        let invalid = || EditorError::InvalidRange {
            start: range.start,
            length: range.length,
            len: utf16_len(&self.source),
        };
        let start = byte_offset(&self.source, range.start).ok_or_else(invalid)?;
        let end = byte_offset(&self.source, range.end()).ok_or_else(invalid)?;
        self.source.replace_range(start..end, text);
        Ok(())
    }

    fn forget(&mut self, removed: Vec<AttachmentEntry>) {
        if !removed.is_empty() {
            self.pipeline.forget(removed.into_iter().map(|entry| entry.id));
        }
    }

    /// Insert `attachment` over the selection; the caret lands after it
    pub fn insert_attachment(&mut self, attachment: Attachment) -> Result<AttachmentId, EditorError> {
        self.ensure_writable()?;
        if self.mode == EditingMode::Source {
            return Err(EditorError::SourceMode);
        }
        let range = self.selection;
        let removed = self.document.delete(range)?;
        self.forget(removed);
        let id = self.document.insert_attachment(range.start, attachment)?;
        self.selection = SelectionRange::caret(range.start + 1);
        Ok(id)
    }

    /// Insert media the host picked after a `media` action
    pub fn insert_media(&mut self, media: MediaAttachment) -> Result<AttachmentId, EditorError> {
        self.insert_attachment(Attachment::Media(media))
    }

    // ------------------------------------------------------------------
    // Toolbar
    // ------------------------------------------------------------------

    /// Run the toolbar action named `identifier` against the selection
    pub fn handle_action(&mut self, identifier: &str) -> Result<ActionOutcome, EditorError> {
        let identifier: FormattingIdentifier = identifier.parse()?;
        log::debug!("Toolbar action {} ({:?} mode)", identifier, self.mode);

        match identifier {
            FormattingIdentifier::Done => Ok(ActionOutcome::Done {
                snapshot: self.snapshot(),
            }),
            FormattingIdentifier::SourceCode => {
                self.ensure_writable()?;
                self.toggle_editing_mode();
                Ok(ActionOutcome::ModeChanged { mode: self.mode })
            }
            _ if self.mode == EditingMode::Source => Ok(ActionOutcome::Ignored),
            FormattingIdentifier::More => {
                self.insert_attachment(Attachment::comment(MORE_TEXT))?;
                Ok(ActionOutcome::Applied)
            }
            FormattingIdentifier::Media => {
                self.ensure_writable()?;
                Ok(ActionOutcome::MediaRequested)
            }
            style => {
                self.ensure_writable()?;
                formatting::toggle(&mut self.document, style, self.selection)?;
                Ok(ActionOutcome::Applied)
            }
        }
    }

    /// Switch between rich and source editing
    ///
    /// Entering source mode serializes the document; leaving it parses the
    /// edited source back.
    pub fn toggle_editing_mode(&mut self) {
        match self.mode {
            EditingMode::Rich => {
                self.source = to_html(&self.document);
                self.mode = EditingMode::Source;
                self.selection = SelectionRange::caret(utf16_len(&self.source));
            }
            EditingMode::Source => {
                let source = std::mem::take(&mut self.source);
                self.mode = EditingMode::Rich;
                self.load_document(from_html(&source));
            }
        }
        log::debug!("Editing mode is now {:?}", self.mode);
    }

    /// Title and HTML as the host should persist them
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.clone(),
            html: self.html(),
        }
    }

    /// Identifiers to highlight for the current selection
    pub fn active_identifiers(&self) -> Result<BTreeSet<FormattingIdentifier>, EditorError> {
        match self.mode {
            EditingMode::Rich => formatting::active_identifiers(&self.document, self.selection),
            EditingMode::Source => Ok(BTreeSet::from([FormattingIdentifier::SourceCode])),
        }
    }

    /// Configured toolbar buttons with their icons and highlight state
    pub fn toolbar_items(&self) -> Result<Vec<ToolbarItem>, EditorError> {
        let active = self.active_identifiers()?;
        Ok(self
            .config
            .toolbar_items
            .iter()
            .map(|&identifier| ToolbarItem {
                identifier,
                icon: self.config.icons.icon_for(identifier).to_string(),
                active: active.contains(&identifier),
            })
            .collect())
    }

    /// The attachment under a one-unit selection
    pub fn selected_attachment(&self) -> Option<&AttachmentEntry> {
        if self.mode != EditingMode::Rich || self.selection.length != 1 {
            return None;
        }
        self.document.attachment_at(self.selection.start)
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    /// Add a renderer ahead of the built-in fallback
    pub fn register_renderer(&mut self, renderer: Box<dyn AttachmentRenderer>) -> Result<(), EditorError> {
        self.registry.register(renderer)
    }

    /// Layout box for attachment `id` inside `line_fragment`
    ///
    /// The first call closes renderer registration.
    pub fn attachment_bounds(&mut self, id: AttachmentId, line_fragment: Rect) -> Result<Rect, EditorError> {
        let (_, entry) = self
            .document
            .attachment(id)
            .ok_or(EditorError::UnknownAttachment(id))?;
        self.registry.freeze();
        Ok(self.registry.bounds_for(&entry.attachment, line_fragment))
    }

    /// Image to draw for attachment `id` right now
    ///
    /// Deferred images arrive through [`Self::process_image_deliveries`].
    pub fn request_image(
        &mut self,
        id: AttachmentId,
        size: Size,
        callbacks: ImageCallbacks,
    ) -> Result<Image, EditorError> {
        let (_, entry) = self
            .document
            .attachment(id)
            .ok_or(EditorError::UnknownAttachment(id))?;
        self.registry.freeze();
        let renderer = self.registry.resolve(&entry.attachment);
        Ok(self.pipeline.request(entry, renderer, size, callbacks))
    }

    /// Drain finished image jobs; returns attachments needing a new layout
    pub fn process_image_deliveries(&mut self) -> Vec<AttachmentId> {
        self.pipeline.process_deliveries()
    }

    pub fn set_spawner(&mut self, spawner: Option<Arc<dyn TaskSpawner>>) {
        self.pipeline.set_spawner(spawner);
    }
}

impl Default for RichTextEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

fn build_registry(config: &EditorConfig, fetcher: Option<Arc<dyn ImageFetcher>>) -> RenderRegistry {
    let (width, height) = config.media_placeholder_size;
    RenderRegistry::with_renderers(
        DefaultRenderer::new(FontMetrics::from(&config.content_font)),
        vec![
            Box::new(CommentRenderer::new(FontMetrics::from(&config.comment_font))),
            Box::new(HtmlRenderer::new(FontMetrics::from(&config.html_font))),
            Box::new(MediaRenderer::new(
                fetcher,
                Size::new(width, height),
                FontMetrics::from(&config.caption_font),
            )),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaSource;
    use crate::renderers::StockImage;

    fn editor_with(html: &str) -> RichTextEditor {
        let mut editor = RichTextEditor::default();
        editor.set_html(html).unwrap();
        editor
    }

    #[test]
    fn test_title_limit() {
        let config = EditorConfig {
            title_character_limit: 5,
            ..EditorConfig::default()
        };
        let mut editor = RichTextEditor::new(config);

        assert!(editor.set_title("héllo").unwrap());
        assert!(!editor.replace_title(SelectionRange::caret(5), "!").unwrap());
        assert_eq!(editor.title(), "héllo");
        assert!(editor.replace_title(SelectionRange::new(1, 1), "e").unwrap());
        assert_eq!(editor.title(), "hello");
        assert!(editor.replace_title(SelectionRange::new(0, 5), "bye").unwrap());
        assert_eq!(editor.title(), "bye");
    }

    #[test]
    fn test_read_only_rejects_mutations() {
        let config = EditorConfig {
            read_only: true,
            ..EditorConfig::default()
        };
        let mut editor = RichTextEditor::new(config);

        assert_eq!(editor.set_html("<p>x</p>"), Err(EditorError::ReadOnly));
        assert_eq!(editor.insert_text("x"), Err(EditorError::ReadOnly));
        assert_eq!(editor.set_title("x"), Err(EditorError::ReadOnly));
        assert_eq!(editor.handle_action("bold"), Err(EditorError::ReadOnly));
        assert!(editor.handle_action("done").is_ok());
        assert!(editor.toolbar_items().is_ok());
    }

    #[test]
    fn test_typing_and_toggling() {
        let mut editor = RichTextEditor::default();
        editor.insert_text("hello").unwrap();
        assert_eq!(editor.selection(), SelectionRange::caret(5));

        editor.set_selection(SelectionRange::new(0, 5)).unwrap();
        assert_eq!(editor.handle_action("bold").unwrap(), ActionOutcome::Applied);
        assert_eq!(editor.html(), "<p><strong>hello</strong></p>");

        let items = editor.toolbar_items().unwrap();
        let bold = items
            .iter()
            .find(|item| item.identifier == FormattingIdentifier::Bold)
            .unwrap();
        assert!(bold.active);
        assert_eq!(bold.icon, "gridicons-bold");
    }

    #[test]
    fn test_rejected_selection_keeps_the_old_one() {
        let mut editor = editor_with("<p>a😀</p>");
        editor.set_selection(SelectionRange::caret(1)).unwrap();

        assert!(matches!(
            editor.set_selection(SelectionRange::caret(2)),
            Err(EditorError::InvalidRange { .. })
        ));
        assert_eq!(editor.selection(), SelectionRange::caret(1));
        assert!(editor.set_selection(SelectionRange::new(0, 4)).is_err());
        assert_eq!(editor.selection(), SelectionRange::caret(1));
    }

    #[test]
    fn test_new_list_item_after_last_one() {
        let mut editor = editor_with("<ol><li>ab</li></ol>");
        editor.set_selection(SelectionRange::caret(2)).unwrap();
        editor.insert_text("\n").unwrap();

        assert!(editor
            .active_identifiers()
            .unwrap()
            .contains(&FormattingIdentifier::OrderedList));
        editor.insert_text("c").unwrap();
        assert_eq!(editor.html(), "<ol><li>ab</li><li>c</li></ol>");
    }

    #[test]
    fn test_unknown_action() {
        let mut editor = RichTextEditor::default();
        assert_eq!(
            editor.handle_action("blink"),
            Err(EditorError::UnknownIdentifier("blink".to_string()))
        );
    }

    #[test]
    fn test_more_inserts_comment() {
        let mut editor = editor_with("<p>ab</p>");
        editor.set_selection(SelectionRange::caret(1)).unwrap();
        editor.handle_action("more").unwrap();

        assert_eq!(editor.html(), "<p>a<!--more-->b</p>");
        assert_eq!(editor.selection(), SelectionRange::caret(2));
    }

    #[test]
    fn test_media_action_asks_host() {
        let mut editor = editor_with("<p>ab</p>");
        assert_eq!(editor.handle_action("media").unwrap(), ActionOutcome::MediaRequested);

        editor.set_selection(SelectionRange::caret(1)).unwrap();
        let media = MediaAttachment::new(MediaSource::Url("https://x.test/a.png".into()));
        let id = editor.insert_media(media).unwrap();

        editor.set_selection(SelectionRange::new(1, 1)).unwrap();
        assert_eq!(editor.selected_attachment().map(|entry| entry.id), Some(id));
        assert!(editor
            .active_identifiers()
            .unwrap()
            .contains(&FormattingIdentifier::Media));
    }

    #[test]
    fn test_source_mode_round_trip() {
        let mut editor = editor_with("<p>one</p>");

        let outcome = editor.handle_action("sourcecode").unwrap();
        assert_eq!(outcome, ActionOutcome::ModeChanged { mode: EditingMode::Source });
        assert_eq!(editor.source(), Some("<p>one</p>"));
        assert_eq!(
            editor.active_identifiers().unwrap(),
            BTreeSet::from([FormattingIdentifier::SourceCode])
        );
        assert_eq!(editor.handle_action("bold").unwrap(), ActionOutcome::Ignored);
        assert_eq!(
            editor.insert_attachment(Attachment::comment("x")),
            Err(EditorError::SourceMode)
        );

        editor.set_selection(SelectionRange::caret(6)).unwrap();
        editor.insert_text(" two").unwrap();
        assert_eq!(editor.html(), "<p>one two</p>");

        editor.handle_action("sourcecode").unwrap();
        assert_eq!(editor.mode(), EditingMode::Rich);
        assert_eq!(editor.document().text(), "one two");
    }

    #[test]
    fn test_done_snapshot() {
        let mut editor = editor_with("<p>body</p>");
        editor.set_title("Title").unwrap();

        let outcome = editor.handle_action("done").unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Done {
                snapshot: Snapshot {
                    title: "Title".into(),
                    html: "<p>body</p>".into(),
                }
            }
        );
    }

    #[test]
    fn test_placeholder_only_when_empty() {
        let config = EditorConfig {
            placeholder: Some("Start writing".into()),
            ..EditorConfig::default()
        };
        let mut editor = RichTextEditor::new(config);
        assert_eq!(editor.placeholder(), Some("Start writing"));
        editor.insert_text("x").unwrap();
        assert_eq!(editor.placeholder(), None);
    }

    #[test]
    fn test_delete_backward() {
        let mut editor = editor_with("<p>a😀</p>");
        editor.set_selection(SelectionRange::caret(3)).unwrap();
        editor.delete_backward().unwrap();
        assert_eq!(editor.document().text(), "a");
        assert_eq!(editor.selection(), SelectionRange::caret(1));
    }

    #[test]
    fn test_bounds_freeze_registry() {
        let mut editor = editor_with("<p>a<!--note-->b</p>");
        let id = editor.document().attachment_at(1).unwrap().id;

        let bounds = editor
            .attachment_bounds(id, Rect::new(0.0, 0.0, 320.0, 20.0))
            .unwrap();
        assert!(bounds.width() > 0.0);
        assert_eq!(
            editor.register_renderer(Box::new(DefaultRenderer::default())),
            Err(EditorError::RegistryFrozen)
        );
        assert_eq!(
            editor.attachment_bounds(AttachmentId(999), Rect::ZERO),
            Err(EditorError::UnknownAttachment(AttachmentId(999)))
        );
    }

    #[test]
    fn test_remote_image_without_fetcher_shows_missing_image() {
        let mut editor = editor_with("<p><img src=\"https://x.test/a.png\" /></p>");
        let id = editor.document().attachment_at(0).unwrap().id;

        let image = editor
            .request_image(id, Size::new(100.0, 100.0), ImageCallbacks::new())
            .unwrap();
        assert!(image.is_stock(StockImage::BrokenImage));
    }
}
