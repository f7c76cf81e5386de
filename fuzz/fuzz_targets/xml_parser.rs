#![no_main]
use libfuzzer_sys::fuzz_target;
use mapsplit::{group_countries, LabelPolicy, XmlParser};

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = XmlParser::new(data).parse() else {
        return;
    };
    // comments and doctypes are skipped unchecked, so utf-8 is not implied by a parse
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = group_countries(&doc, source, LabelPolicy::SkipUnlabeled);
    }
});
