use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

const PAGE_WIDTH: f32 = 1190.0;
const PAGE_HEIGHT: f32 = 842.0;
const FONT_SIZE: f32 = 10.0;
/// Glyph advance of every fixture font, in thousandths of the font size.
const GLYPH_WIDTH: i64 = 600;

pub const DAYS: [&str; 5] = ["Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag"];

/// Words and ruling lines in top-left page coordinates, as the extractor
/// reports them.
#[derive(Debug, Clone, Default)]
pub struct TestPage {
    pub words: Vec<(String, f32, f32)>,
    pub lines: Vec<((f32, f32), (f32, f32))>,
}

impl TestPage {
    pub fn word(&mut self, text: &str, x: f32, top: f32) {
        self.words.push((text.to_string(), x, top));
    }
}

/// `(period, day_index, subject, teacher, room)`
pub type TestLesson<'a> = (u32, usize, &'a str, &'a str, &'a str);

pub fn day_x(day_index: usize) -> f32 {
    100.0 + 200.0 * day_index as f32
}

pub fn period_top(period: u32) -> f32 {
    100.0 + 50.0 * (period - 1) as f32
}

/// A ruled class timetable laid out like a school export: header, weekday
/// row, period labels down the left and three-line lesson cells.
pub fn class_page(class_name: &str, class_teachers: &str, lessons: &[TestLesson<'_>]) -> TestPage {
    let periods = lessons
        .iter()
        .map(|(period, ..)| *period)
        .max()
        .unwrap_or(1);

    let mut page = TestPage::default();
    page.word("Lessing-Gymnasium", 30.0, 10.0);
    page.word("8.1.2026,13:47", 900.0, 20.0);
    page.word(class_name, 30.0, 35.0);
    page.word(class_teachers, 30.0, 50.0);
    for (index, day) in DAYS.iter().enumerate() {
        page.word(day, day_x(index), 70.0);
    }
    for period in 1..=periods {
        page.word(&period.to_string(), 40.0, period_top(period));
    }
    for (period, day_index, subject, teacher, room) in lessons {
        let x = day_x(*day_index) + 5.0;
        let top = period_top(*period);
        page.word(subject, x, top - 4.0);
        page.word(teacher, x, top + 6.0);
        page.word(room, x, top + 16.0);
    }

    let bottom = 90.0 + 50.0 * periods as f32;
    for x in [30.0, 90.0, 290.0, 490.0, 690.0, 890.0, 1090.0] {
        page.lines.push(((x, 60.0), (x, bottom)));
    }
    let mut rules = vec![60.0, 90.0];
    rules.extend((1..=periods).map(|period| 90.0 + 50.0 * period as f32));
    for top in rules {
        page.lines.push(((30.0, top), (1090.0, top)));
    }
    page
}

/// How the fixture encodes its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFont {
    /// Courier with WinAnsiEncoding, one byte per character.
    WinAnsi,
    /// A Type0 font with Identity-H encoding: two-byte codes that only the
    /// `ToUnicode` CMap maps back to characters.
    Identity,
}

/// Two-byte character codes for the Identity-H font, assigned from 1 in
/// character order.
struct CidCodes(BTreeMap<char, u16>);

impl CidCodes {
    fn for_pages(pages: &[TestPage]) -> Self {
        let mut chars = pages
            .iter()
            .flat_map(|page| page.words.iter())
            .flat_map(|(text, _, _)| text.chars())
            .collect::<Vec<_>>();
        chars.sort_unstable();
        chars.dedup();
        Self(
            chars
                .into_iter()
                .zip(1u16..)
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .filter_map(|ch| self.0.get(&ch))
            .flat_map(|code| code.to_be_bytes())
            .collect()
    }

    fn to_unicode_cmap(&self) -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let entries = self.0.iter().collect::<Vec<_>>();
        for chunk in entries.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for (ch, code) in chunk {
                let unicode = ch
                    .encode_utf16(&mut [0; 2])
                    .iter()
                    .map(|unit| format!("{unit:04X}"))
                    .collect::<String>();
                let _ = writeln!(cmap, "<{code:04X}> <{unicode}>");
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap.into_bytes()
    }
}

pub fn cover_page() -> TestPage {
    let mut page = TestPage::default();
    page.word("Lessing-Gymnasium", 30.0, 10.0);
    page.word("Stundenplan", 400.0, 300.0);
    page.word("Klassen", 400.0, 320.0);
    page
}

fn operations(page: &TestPage, codes: Option<&CidCodes>) -> Vec<Operation> {
    let mut operations = Vec::new();
    for (text, x, top) in &page.words {
        let bytes = match codes {
            Some(codes) => codes.encode(text),
            None => WINDOWS_1252.encode(text).0.into_owned(),
        };
        let format = if codes.is_some() {
            StringFormat::Hexadecimal
        } else {
            StringFormat::Literal
        };
        let baseline = PAGE_HEIGHT - top - FONT_SIZE * 0.8;
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("Td", vec![(*x).into(), baseline.into()]),
            Operation::new("Tj", vec![Object::String(bytes, format)]),
            Operation::new("ET", vec![]),
        ]);
    }
    for ((x1, top1), (x2, top2)) in &page.lines {
        operations.extend([
            Operation::new("m", vec![(*x1).into(), (PAGE_HEIGHT - top1).into()]),
            Operation::new("l", vec![(*x2).into(), (PAGE_HEIGHT - top2).into()]),
            Operation::new("S", vec![]),
        ]);
    }
    operations
}

fn add_identity_font(doc: &mut Document, codes: &CidCodes) -> ObjectId {
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "FixtureMono",
        "Flags" => 33,
        "FontBBox" => vec![0.into(), (-200).into(), GLYPH_WIDTH.into(), 800.into()],
        "ItalicAngle" => 0,
        "Ascent" => 800,
        "Descent" => -200,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let widths = codes
        .0
        .values()
        .map(|_| Object::Integer(GLYPH_WIDTH))
        .collect::<Vec<_>>();
    let descendant = dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "FixtureMono",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => GLYPH_WIDTH,
        "W" => vec![1.into(), Object::Array(widths)],
    };
    let to_unicode_id = doc.add_object(Stream::new(Dictionary::new(), codes.to_unicode_cmap()));
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "FixtureMono",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Dictionary(descendant)],
        "ToUnicode" => to_unicode_id,
    })
}

pub fn create_schedule_pdf(
    path: &Path,
    pages: &[TestPage],
) -> Result<(), Box<dyn std::error::Error>> {
    create_schedule_pdf_with_font(path, pages, FixtureFont::WinAnsi)
}

pub fn create_schedule_pdf_with_font(
    path: &Path,
    pages: &[TestPage],
    font: FixtureFont,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let codes = (font == FixtureFont::Identity).then(|| CidCodes::for_pages(pages));
    let font_id = match &codes {
        Some(codes) => add_identity_font(&mut doc, codes),
        None => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        }),
    };
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for page in pages {
        let content = Content {
            operations: operations(page, codes.as_ref()),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}
