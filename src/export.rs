//! Transcript export to a paginated PDF.
//!
//! Layout is computed first as plain data (pages of positioned text runs) so
//! pagination can be checked without a PDF reader; [`render_pdf`] then turns
//! the pages into a document with `lopdf`.

use std::path::{Path, PathBuf};

use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::{info, warn};
use uuid::Uuid;

use crate::history::{HistoryEntry, normalize};
use crate::session::{Message, Role};

pub const TITLE: &str = "AI Tuition Chat Export";
pub const PAGE_WIDTH: i64 = 595;
pub const PAGE_HEIGHT: i64 = 842;
pub const TOP_Y: i64 = 800;
pub const BOTTOM_MARGIN: i64 = 90;
pub const WRAP_COLUMNS: usize = 90;

const TITLE_SIZE: i64 = 14;
const TITLE_GAP: i64 = 40;
const SPEAKER_X: i64 = 40;
const SPEAKER_GAP: i64 = 15;
const BODY_X: i64 = 50;
const BODY_SIZE: i64 = 10;
const LINE_HEIGHT: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub font: Font,
    pub size: i64,
    pub x: i64,
    pub y: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

/// Greedy word wrap by character count.
///
/// Each `\n`-separated paragraph is cut at the last space inside the first
/// `width` characters, or hard-cut at `width` when there is none. Empty
/// paragraphs still produce a (blank) line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for para in text.split('\n') {
        let mut para = para.strip_suffix('\r').unwrap_or(para);
        while para.chars().count() > width {
            let head_end = para.char_indices().nth(width).map_or(para.len(), |(i, _)| i);
            let cut = para[..head_end].rfind(' ').unwrap_or(head_end);
            lines.push(para[..cut].to_string());
            para = para[cut..].trim_start();
        }
        lines.push(para.to_string());
    }
    lines
}

struct Cursor {
    pages: Vec<Page>,
    y: i64,
}

impl Cursor {
    fn new() -> Self {
        Self { pages: vec![Page::default()], y: TOP_Y }
    }

    fn draw(&mut self, font: Font, size: i64, x: i64, text: &str) {
        let run = TextRun { font, size, x, y: self.y, text: text.to_string() };
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(run);
        }
    }

    fn break_if_low(&mut self) {
        if self.y < BOTTOM_MARGIN {
            self.pages.push(Page::default());
            self.y = TOP_Y;
        }
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You:",
        Role::Assistant => "Tutor:",
    }
}

/// Lays the transcript out on fixed-height pages. Empty input lays out nothing.
pub fn layout(messages: &[Message]) -> Vec<Page> {
    if messages.is_empty() {
        return Vec::new();
    }

    let mut c = Cursor::new();
    c.draw(Font::Bold, TITLE_SIZE, SPEAKER_X, TITLE);
    c.y -= TITLE_GAP;

    for m in messages {
        c.break_if_low();
        c.draw(Font::Bold, BODY_SIZE, SPEAKER_X, speaker(m.role));
        c.y -= SPEAKER_GAP;

        // every body run names its font, so a fresh page starts in the body font
        for line in wrap_text(&m.content, WRAP_COLUMNS) {
            c.draw(Font::Regular, BODY_SIZE, BODY_X, &line);
            c.y -= LINE_HEIGHT;
            c.break_if_low();
        }
        c.y -= LINE_HEIGHT;
    }

    // a break forced by the very last line leaves a blank page behind
    while c.pages.last().is_some_and(|p| p.runs.is_empty()) {
        c.pages.pop();
    }
    c.pages
}

/// Single-byte WinAnsi rendition of `text`; anything unrepresentable becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => ch as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Writes laid-out pages as an A4 PDF with the standard Helvetica faces.
pub fn render_pdf(pages: &[Page], path: &Path) -> anyhow::Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular_id,
            Font::Bold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.runs.len() * 5);
        for run in &page.runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(run.font.resource_name().as_bytes().to_vec()), Object::Integer(run.size)],
            ));
            operations.push(Operation::new("Td", vec![Object::Integer(run.x), Object::Integer(run.y)]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(&run.text))]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ]),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

/// `tuition_<timestamp>_<random>.pdf` inside `dir`.
pub fn export_file_name(dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let id = Uuid::new_v4().simple().to_string();
    dir.join(format!("tuition_{stamp}_{}.pdf", &id[..8]))
}

/// Exports into `dir`. `None` when there is nothing to export or the PDF could not be written.
pub fn export_transcript_to<I>(history: I, dir: &Path) -> Option<PathBuf>
where
    I: IntoIterator,
    I::Item: Into<HistoryEntry>,
{
    let messages = normalize(history);
    let pages = layout(&messages);
    if pages.is_empty() {
        return None;
    }
    let path = export_file_name(dir);
    match render_pdf(&pages, &path) {
        Ok(()) => {
            info!(path = %path.display(), pages = pages.len(), messages = messages.len(), "transcript exported");
            Some(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "transcript export failed");
            None
        }
    }
}

/// Exports into the system temp directory.
pub fn export_transcript<I>(history: I) -> Option<PathBuf>
where
    I: IntoIterator,
    I::Item: Into<HistoryEntry>,
{
    export_transcript_to(history, &std::env::temp_dir())
}
