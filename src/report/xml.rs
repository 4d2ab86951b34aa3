use std::io::Write;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Entry, Report};
use crate::error::Result;

fn write_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::borrowed_name(tag.as_bytes())))?;
    writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
    writer.write_event(Event::End(BytesEnd::borrowed(tag.as_bytes())))?;
    Ok(())
}

fn write_entries<W: Write>(
    writer: &mut Writer<W>,
    entries: &[Entry],
    element: &str,
    key_tag: &str,
    value_tag: &str,
) -> Result<()> {
    for entry in entries {
        writer.write_event(Event::Start(BytesStart::borrowed_name(element.as_bytes())))?;
        write_element(writer, key_tag, &entry.key)?;
        write_element(writer, value_tag, &entry.value)?;
        writer.write_event(Event::End(BytesEnd::borrowed(element.as_bytes())))?;
    }
    Ok(())
}

/// `<Report>` with one `<Word>` per ranked word and one `<Smiley>` per position,
/// indented by four spaces. Text content is escaped by the writer.
pub fn write_xml<W: Write>(report: &Report, out: &mut W) -> Result<()> {
    let mut writer = Writer::new_with_indent(&mut *out, b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new(b"1.0", Some(b"utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::borrowed_name(b"Report")))?;
    write_entries(&mut writer, &report.words, "Word", "word", "frequency")?;
    write_entries(&mut writer, &report.smileys, "Smiley", "code", "position")?;
    writer.write_event(Event::End(BytesEnd::borrowed(b"Report")))?;
    out.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResultPair, LABEL_CODE, LABEL_WORD};

    #[test]
    fn test_special_characters_are_escaped() {
        let words: Vec<ResultPair> = ResultPair::couple(LABEL_WORD, "<a&b>", 1).into_iter().collect();
        let smileys: Vec<ResultPair> = ResultPair::couple(LABEL_CODE, ":-]", 4).into_iter().collect();
        let report = Report::from_pairs(&words, &smileys).expect("paired input");

        let mut out = Vec::new();
        write_xml(&report, &mut out).expect("render");
        let xml = String::from_utf8(out).expect("utf8");
        assert!(xml.contains("<word>&lt;a&amp;b&gt;</word>"));
        assert!(xml.contains("<code>:-]</code>"));
        assert!(xml.contains("<position>4</position>"));
    }

    #[test]
    fn test_empty_report_is_well_formed() {
        let report = Report::from_pairs(&[], &[]).expect("empty input");
        let mut out = Vec::new();
        write_xml(&report, &mut out).expect("render");
        let xml = String::from_utf8(out).expect("utf8");
        assert_eq!(xml, "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Report>\n</Report>\n");
    }
}
