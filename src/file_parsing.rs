use crate::file_discovery::{FileSpecEntry, FileSpecLocation};
use crate::{pdf_utils, Attachment, PreconsumeError, Result};
use lopdf::{Dictionary, Document, Stream};

/// Resolves discovered file specifications into [`Attachment`]s.
pub struct FileSpecParser<'a> {
    document: &'a Document,
}

impl<'a> FileSpecParser<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    fn resolution_error(name: &str, reason: impl Into<String>) -> PreconsumeError {
        PreconsumeError::AttachmentResolution {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Resolve one entry into its filename and fully-read content.
    ///
    /// Layout of a file specification (PDF spec §7.11.3):
    ///
    /// ```text
    /// <<
    ///   /Type  /Filespec
    ///   /F     (ascii filename)
    ///   /UF    (unicode filename)          ← preferred
    ///   /EF    <<
    ///              /F   <stream-ref>       ← preferred
    ///              /UF  <stream-ref>
    ///          >>
    /// >>
    /// ```
    pub fn parse(&self, entry: &FileSpecEntry) -> Result<Attachment> {
        let name = entry.name.as_str();
        let spec_dict = match &entry.location {
            FileSpecLocation::Reference(id) => self
                .document
                .get_dictionary(*id)
                .map_err(|e| Self::resolution_error(name, format!("file spec: {e}")))?,
            FileSpecLocation::Inline(dict) => dict,
            FileSpecLocation::Invalid(reason) => return Err(Self::resolution_error(name, *reason)),
        };

        let filename = Self::best_filename(spec_dict)
            .or_else(|| (!name.is_empty()).then(|| name.to_owned()))
            .ok_or_else(|| Self::resolution_error(name, "file spec has no filename"))?;

        let ef_dict = self.resolve_ef_dictionary(spec_dict, &filename)?;
        let stream = self.embedded_stream(ef_dict, &filename)?;

        // Unsupported filters leave the stored bytes as they are.
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        Ok(Attachment { filename, data })
    }

    fn resolve_ef_dictionary<'b>(&'b self, spec_dict: &'b Dictionary, name: &str) -> Result<&'b Dictionary> {
        let ef_val = spec_dict
            .get(b"EF")
            .map_err(|_| Self::resolution_error(name, "missing /EF entry"))?;

        // Some producers store /EF as a reference.
        pdf_utils::resolve(self.document, ef_val)
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| Self::resolution_error(name, "/EF is not a dictionary"))
    }

    fn embedded_stream<'b>(&'b self, ef_dict: &'b Dictionary, name: &str) -> Result<&'b Stream> {
        let stream_ref = ef_dict
            .get(b"F")
            .or_else(|_| ef_dict.get(b"UF"))
            .map_err(|_| Self::resolution_error(name, "/EF has neither /F nor /UF"))?;

        pdf_utils::resolve(self.document, stream_ref)
            .and_then(|o| o.as_stream().ok())
            .ok_or_else(|| Self::resolution_error(name, "embedded file is not a stream"))
    }

    /// Unicode (/UF) name over ASCII (/F) name.
    fn best_filename(spec_dict: &Dictionary) -> Option<String> {
        [b"UF" as &[u8], b"F"]
            .into_iter()
            .find_map(|key| pdf_utils::extract_string_from_dict(spec_dict, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    fn entry(location: FileSpecLocation) -> FileSpecEntry {
        FileSpecEntry {
            name: "key.pdf".into(),
            location,
        }
    }

    #[test]
    fn resolves_uf_name_and_raw_content() {
        let mut doc = Document::with_version("1.7");
        let stream_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "EmbeddedFile" },
            b"%PDF-1.4 inner".to_vec(),
        ));
        let spec_id = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::string_literal("ascii.pdf"),
            "UF" => Object::string_literal("unicode.pdf"),
            "EF" => dictionary! { "F" => stream_id },
        });

        let file = FileSpecParser::new(&doc)
            .parse(&entry(FileSpecLocation::Reference(spec_id)))
            .unwrap();
        assert_eq!(file.filename, "unicode.pdf");
        assert_eq!(file.data, b"%PDF-1.4 inner");
    }

    #[test]
    fn falls_back_to_tree_key_for_name() {
        let mut doc = Document::with_version("1.7");
        let stream_id = doc.add_object(Stream::new(dictionary! {}, b"x".to_vec()));
        let spec = dictionary! { "EF" => dictionary! { "UF" => stream_id } };

        let file = FileSpecParser::new(&doc)
            .parse(&entry(FileSpecLocation::Inline(spec)))
            .unwrap();
        assert_eq!(file.filename, "key.pdf");
    }

    #[test]
    fn missing_ef_is_resolution_failure() {
        let doc = Document::with_version("1.7");
        let spec = dictionary! { "F" => Object::string_literal("a.pdf") };
        let err = FileSpecParser::new(&doc)
            .parse(&entry(FileSpecLocation::Inline(spec)))
            .unwrap_err();
        assert!(matches!(err, PreconsumeError::AttachmentResolution { ref name, .. } if name == "a.pdf"));
    }

    #[test]
    fn dangling_reference_is_resolution_failure() {
        let doc = Document::with_version("1.7");
        let err = FileSpecParser::new(&doc)
            .parse(&entry(FileSpecLocation::Reference((42, 0))))
            .unwrap_err();
        assert!(matches!(err, PreconsumeError::AttachmentResolution { .. }));
    }
}
