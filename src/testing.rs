//! Generated PDF fixtures and output inspectors for tests and benches

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Build an `n` page letter-size PDF. Page `i` shows the text `marker-i` and
/// every page shares one font object.
pub fn build_pdf(n: u32) -> Vec<u8> {
    build(n, false)
}

/// Like [`build_pdf`], but MediaBox, Resources and Rotate live only on the
/// `/Pages` node and every page inherits them.
pub fn build_inherited_pdf(n: u32) -> Vec<u8> {
    build(n, true)
}

fn letter_box() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ])
}

fn build(n: u32, inherited: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]);

    let mut page_ids = Vec::new();
    for i in 1..=n {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(24)],
                ),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("marker-{}", i).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("encode content"),
        ));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if !inherited {
            page.set("MediaBox", letter_box());
            page.set("Resources", Object::Dictionary(resources.clone()));
        }
        page_ids.push(doc.add_object(page));
    }

    let mut pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(i64::from(n))),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if inherited {
        pages.set("MediaBox", letter_box());
        pages.set("Resources", Object::Dictionary(resources));
        pages.set("Rotate", Object::Integer(90));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save fixture");
    buffer
}

fn load(data: &[u8]) -> Document {
    Document::load_mem(data).expect("output should parse as PDF")
}

fn page_ids(doc: &Document) -> Vec<ObjectId> {
    // get_pages is keyed by 1-based page number, so values come out in page order
    doc.get_pages().into_values().collect()
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    while let Object::Reference(id) = current {
        current = doc.get_object(*id).expect("dangling reference");
    }
    current
}

fn page_dict(doc: &Document, id: ObjectId) -> &Dictionary {
    doc.get_object(id)
        .and_then(Object::as_dict)
        .expect("page dictionary")
}

/// The `marker-N` number shown on each page, in page order
pub fn page_markers(data: &[u8]) -> Vec<u32> {
    let doc = load(data);
    page_ids(&doc)
        .into_iter()
        .map(|id| {
            let content = doc.get_page_content(id).expect("page content");
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(marker-").expect("page has a marker") + "(marker-".len();
            let digits: String = text[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().expect("marker number")
        })
        .collect()
}

/// Width and height of the JPEG image XObject drawn on each page
pub fn image_pages(data: &[u8]) -> Vec<(i64, i64)> {
    let doc = load(data);
    page_ids(&doc)
        .into_iter()
        .map(|id| {
            let page = page_dict(&doc, id);
            let resources = resolve(&doc, page.get(b"Resources").expect("resources"))
                .as_dict()
                .expect("resources dictionary");
            let xobjects = resolve(&doc, resources.get(b"XObject").expect("xobjects"))
                .as_dict()
                .expect("xobject dictionary");
            let (_, image) = xobjects.iter().next().expect("one image per page");
            let image = resolve(&doc, image).as_stream().expect("image stream");

            let filter = image.dict.get(b"Filter").and_then(Object::as_name);
            assert_eq!(filter.expect("filter"), b"DCTDecode");

            let width = image.dict.get(b"Width").and_then(Object::as_i64);
            let height = image.dict.get(b"Height").and_then(Object::as_i64);
            (width.expect("width"), height.expect("height"))
        })
        .collect()
}

/// MediaBox of each page as `[x0, y0, x1, y1]`
pub fn media_box(data: &[u8]) -> Vec<[f32; 4]> {
    let doc = load(data);
    page_ids(&doc)
        .into_iter()
        .map(|id| {
            let page = page_dict(&doc, id);
            let array = resolve(&doc, page.get(b"MediaBox").expect("media box"))
                .as_array()
                .expect("media box array");
            let mut corners = [0.0f32; 4];
            for (corner, value) in corners.iter_mut().zip(array) {
                *corner = resolve(&doc, value).as_float().expect("number");
            }
            corners
        })
        .collect()
}

/// Number of font dictionaries stored in the document
pub fn font_objects(data: &[u8]) -> usize {
    let doc = load(data);
    doc.objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter(|dict| {
            dict.get(b"Type")
                .and_then(Object::as_name)
                .map(|name| name == b"Font")
                .unwrap_or(false)
        })
        .count()
}

/// Whether each page dictionary itself carries MediaBox, Resources and Rotate
pub fn own_page_attributes(data: &[u8]) -> Vec<(bool, bool, bool)> {
    let doc = load(data);
    page_ids(&doc)
        .into_iter()
        .map(|id| {
            let page = page_dict(&doc, id);
            (
                page.has(b"MediaBox"),
                page.has(b"Resources"),
                page.has(b"Rotate"),
            )
        })
        .collect()
}
