//! Builders for small in-memory PDFs.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// A text run placed at `(x, y)` in page space.
pub type Run<'a> = (i64, i64, &'a str);

/// Build a PDF with one page per slice of runs. Runs are written in the
/// order given, which need not be reading order.
pub fn text_pdf(pages: &[&[Run]]) -> Vec<u8> {
    build(pages.iter().map(|runs| text_content(runs)).collect())
}

/// Build a one-page PDF that only paints a filled rectangle.
pub fn image_only_pdf() -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("re", vec![50.into(), 50.into(), 400.into(), 600.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    build(vec![content])
}

fn text_content(runs: &[Run]) -> Content {
    let mut operations = Vec::with_capacity(runs.len() * 5);
    for (x, y, text) in runs {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
        operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn build(contents: Vec<Content>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(contents.len());
    for content in contents {
        let stream = Stream::new(dictionary! {}, content.encode().unwrap());
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A two-page card-type summary statement for the given month. Columns are
/// emitted amount-first so reading order depends on reconstruction.
pub fn card_type_statement(month: u32) -> Vec<u8> {
    let period = format!("Statement Period {:02}/01/24 - {:02}/28/24", month, month);
    let page_one: Vec<Run> = vec![
        (72, 740, "MERCHANT STATEMENT"),
        (72, 720, period.as_str()),
        (300, 700, "$20,000.00"),
        (72, 700, "Amounts Submitted"),
        (72, 670, "SUMMARY BY CARD TYPE"),
        (72, 650, "Card Type"),
        (250, 650, "Items"),
        (350, 650, "Amount"),
        (350, 630, "$12,000.00"),
        (250, 630, "120"),
        (72, 630, "Visa"),
        (350, 615, "$8,000.00"),
        (250, 616, "80"),
        (72, 614, "Mastercard"),
        (72, 600, "Total"),
        (250, 600, "200"),
        (350, 600, "$20,000.00"),
    ];
    let page_two: Vec<Run> = vec![
        (72, 740, "CHARGEBACKS/REVERSALS"),
        (72, 720, "No Chargebacks/Reversals for this statement period"),
    ];
    text_pdf(&[page_one.as_slice(), page_two.as_slice()])
}
