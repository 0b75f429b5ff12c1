//! Plain text to PDF conversion.
//!
//! Pages are A4 with the built-in Courier font, so the text keeps the column layout
//! produced by the tera layout. Nothing time- or random-dependent is written: the
//! same text always yields the same bytes.

use crate::errors::Result;
use lopdf::{
    Document, Object, Stream, StringFormat,
    content::{Content, Operation},
    dictionary,
};

/// A4 width in points
pub const PAGE_WIDTH: i64 = 595;
/// A4 height in points
pub const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 12;

/// Lines that fit between the top and bottom margins
pub const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Characters that fit between the side margins (Courier glyphs are 0.6 em wide)
pub const COLUMNS_PER_LINE: usize = ((PAGE_WIDTH - 2 * MARGIN) * 10 / (FONT_SIZE * 6)) as usize;

const TAB_WIDTH: usize = 4;
const FORM_FEED: char = '\u{c}';

/// Lays out `text` on as many pages as needed and encodes the document.
///
/// A form feed starts a new page; overlong lines are wrapped.
pub fn text_to_pdf(text: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in paginate(text) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new(
                "Td",
                vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()],
            ),
        ];
        for line in &lines {
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Splits text into pages of at most [`LINES_PER_PAGE`] lines. Always yields one page.
fn paginate(text: &str) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for (index, chunk) in text.split(FORM_FEED).enumerate() {
        if index > 0 {
            pages.push(std::mem::take(&mut current));
        }
        for raw_line in chunk.lines() {
            for line in wrap(&raw_line.replace('\t', &" ".repeat(TAB_WIDTH))) {
                if current.len() == LINES_PER_PAGE {
                    pages.push(std::mem::take(&mut current));
                }
                current.push(line);
            }
        }
    }
    pages.push(current);
    pages
}

fn wrap(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(COLUMNS_PER_LINE)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Maps text to `WinAnsiEncoding` bytes; unmappable characters become `?`.
#[must_use]
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}
