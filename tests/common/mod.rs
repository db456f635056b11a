// PDF fixtures generated with lopdf at test time.

#![allow(dead_code)]

use lopdf::{dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, StringFormat};
use std::path::{Path, PathBuf};

/// Builds a one-page PDF with optional attachments and encryption.
#[derive(Default)]
pub struct PdfBuilder {
    attachments: Vec<(String, Vec<u8>)>,
    broken_attachments: Vec<String>,
    annotation_attachments: Vec<(String, Vec<u8>)>,
    compress: bool,
    user_password: Option<String>,
    owner_password: Option<String>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed a file through the /Names/EmbeddedFiles tree.
    pub fn attachment(mut self, name: &str, data: &[u8]) -> Self {
        self.attachments.push((name.into(), data.to_vec()));
        self
    }

    /// Add a name-tree entry whose file specification has no /EF.
    pub fn broken_attachment(mut self, name: &str) -> Self {
        self.broken_attachments.push(name.into());
        self
    }

    /// Embed a file through a FileAttachment annotation on the page.
    pub fn annotation_attachment(mut self, name: &str, data: &[u8]) -> Self {
        self.annotation_attachments.push((name.into(), data.to_vec()));
        self
    }

    /// FlateDecode the embedded streams.
    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    /// Require `password` to open the document.
    pub fn user_password(mut self, password: &str) -> Self {
        self.user_password = Some(password.into());
        self.owner_password = Some(format!("{password}-owner"));
        self
    }

    /// Encrypt with an empty user password and only an owner password.
    pub fn owner_password_only(mut self, password: &str) -> Self {
        self.user_password = Some(String::new());
        self.owner_password = Some(password.into());
        self
    }

    fn embed(&self, doc: &mut Document, name: &str, data: &[u8]) -> (u32, u16) {
        let mut stream = Stream::new(dictionary! { "Type" => "EmbeddedFile" }, data.to_vec());
        if self.compress {
            stream.compress().unwrap();
        }
        let stream_id = doc.add_object(stream);
        doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::string_literal(name),
            "UF" => Object::string_literal(name),
            "EF" => dictionary! { "F" => stream_id },
        })
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(vec![1u8; 16], StringFormat::Literal),
                Object::String(vec![2u8; 16], StringFormat::Literal),
            ]),
        );

        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 12 Tf 72 720 Td (fixture) Tj ET".to_vec(),
        ));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792),
            ],
            "Contents" => content_id,
        };

        let mut annots = Vec::new();
        for (name, data) in &self.annotation_attachments {
            let spec_id = self.embed(&mut doc, name, data);
            let annot_id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "FileAttachment",
                "Rect" => vec![
                    Object::Integer(10), Object::Integer(10), Object::Integer(30), Object::Integer(30),
                ],
                "FS" => spec_id,
                "Contents" => Object::string_literal(name.as_str()),
            });
            annots.push(Object::Reference(annot_id));
        }
        if !annots.is_empty() {
            page.set("Annots", annots);
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );

        let mut names = Vec::new();
        for (name, data) in &self.attachments {
            let spec_id = self.embed(&mut doc, name, data);
            names.push(Object::string_literal(name.as_str()));
            names.push(Object::Reference(spec_id));
        }
        for name in &self.broken_attachments {
            let spec_id = doc.add_object(dictionary! {
                "Type" => "Filespec",
                "F" => Object::string_literal(name.as_str()),
            });
            names.push(Object::string_literal(name.as_str()));
            names.push(Object::Reference(spec_id));
        }

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if !names.is_empty() {
            catalog.set("Names", dictionary! { "EmbeddedFiles" => dictionary! { "Names" => names } });
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let (Some(user), Some(owner)) = (&self.user_password, &self.owner_password) {
            let version = EncryptionVersion::V2 {
                document: &doc,
                owner_password: owner,
                user_password: user,
                key_length: 128,
                permissions: Permissions::all(),
            };
            let state = EncryptionState::try_from(version).unwrap();
            doc.encrypt(&state).unwrap();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        std::fs::write(path, self.build()).unwrap();
        path.to_path_buf()
    }
}

/// Write a password file with one entry per line.
pub fn password_file(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("passwords.txt");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// Sorted names of the regular files directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
