//! lopdf fixture builder shared by unit and integration tests.

use lopdf::content::{Content, Operation};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FixturePage {
    pub width: f32,
    pub height: f32,
    pub label: String,
    /// Incompressible filler appended to the content stream.
    pub padding: usize,
    /// Leave MediaBox off the page so it comes from the page tree root.
    pub inherit_box: bool,
}

impl FixturePage {
    pub fn new(label: &str) -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            label: label.to_string(),
            padding: 0,
            inherit_box: false,
        }
    }

    /// Pages labelled "1".."n", page `i` being `600 + i` points wide.
    pub fn numbered(n: usize) -> Vec<Self> {
        (1..=n)
            .map(|i| Self {
                width: 600.0 + i as f32,
                ..Self::new(&i.to_string())
            })
            .collect()
    }

    pub fn padded(n: usize, padding: usize) -> Vec<Self> {
        Self::numbered(n)
            .into_iter()
            .map(|page| Self { padding, ..page })
            .collect()
    }

    pub fn inheriting() -> Self {
        Self {
            inherit_box: true,
            ..Self::new("1")
        }
    }
}

fn filler(len: usize, seed: usize) -> String {
    let mut state = (seed as u64).wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
    let mut out = String::with_capacity(len + len / 64 + 2);
    out.push('%');
    for i in 0..len {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let c = b'!' + ((state >> 33) % 90) as u8;
        out.push(c as char);
        if i % 64 == 63 {
            out.push_str("\n%");
        }
    }
    out.push('\n');
    out
}

/// A document with `pages`. Every page references the same shared stream of
/// `shared` bytes when `shared > 0`.
pub fn fixture_document(pages: &[FixturePage], shared: usize) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));

    let shared_id = (shared > 0).then(|| {
        doc.add_object(Stream::new(
            Dictionary::new(),
            filler(shared, 7_919).into_bytes(),
        ))
    });

    let mut resources = Dictionary::new();
    resources.set(
        "Font",
        Dictionary::from_iter(vec![("F1", Object::Reference(font_id))]),
    );
    if let Some(id) = shared_id {
        resources.set(
            "Properties",
            Dictionary::from_iter(vec![("Blob", Object::Reference(id))]),
        );
    }
    let resources_id = doc.add_object(resources);

    let mut kids = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        page.label.clone().into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let mut bytes = content.encode().unwrap();
        if page.padding > 0 {
            bytes.extend_from_slice(filler(page.padding, i + 1).as_bytes());
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));

        let mut dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]);
        if !page.inherit_box {
            dict.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page.width.into()),
                    Object::Real(page.height.into()),
                ]),
            );
        }
        kids.push(Object::Reference(doc.add_object(dict)));
    }

    let count = kids.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Write [`fixture_document`] to `dir/name`.
pub fn build_pdf_with_shared(dir: &Path, name: &str, pages: &[FixturePage], shared: usize) -> PathBuf {
    let mut doc = fixture_document(pages, shared);
    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write `pages` to `dir/name` protected by RC4 (V2, 128-bit key) with
/// `password` as both the user and owner password.
pub fn build_encrypted_pdf(dir: &Path, name: &str, pages: &[FixturePage], password: &str) -> PathBuf {
    let mut doc = fixture_document(pages, 0);
    let id = Object::String(b"pdftools-fixture".to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: password,
        user_password: password,
        key_length: 128,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version).unwrap();
    doc.encrypt(&state).unwrap();

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

pub fn build_pdf(dir: &Path, name: &str, pages: &[FixturePage]) -> PathBuf {
    build_pdf_with_shared(dir, name, pages, 0)
}

/// Widths of every page in `path`, in page order.
pub fn page_widths(path: &Path) -> Vec<f32> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let dict = doc.get_dictionary(id).unwrap();
            let media_box = dict.get(b"MediaBox").unwrap().as_array().unwrap();
            match (&media_box[0], &media_box[2]) {
                (Object::Integer(x0), Object::Integer(x1)) => (x1 - x0) as f32,
                (x0, x1) => to_f32(x1) - to_f32(x0),
            }
        })
        .collect()
}

fn to_f32(object: &Object) -> f32 {
    match object {
        Object::Integer(i) => *i as f32,
        #[allow(clippy::unnecessary_cast)]
        Object::Real(r) => *r as f32,
        _ => panic!("not a number: {object:?}"),
    }
}
