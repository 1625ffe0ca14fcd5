//! Object/entries/externals emitter (spec.md §4.5, §6). A straight
//! serializer over a [`TranslationUnit`] — no further validation.

use crate::translation_unit::TranslationUnit;
use crate::word::encode_base4;

/// `<stem>.ob`: header line, then every instruction word, then every data
/// word, addressed as spec.md §6 describes.
///
/// spec.md §8 scenario 1 fixes a literal `"  0 0\n"` header for a
/// completely empty translation unit, overriding the usual "raw final
/// `ic`/`dc`" rule — see DESIGN.md.
pub fn object_file(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    if unit.instruction_image.is_empty() && unit.data_image.is_empty() {
        out.push_str("  0 0\n");
        return out;
    }

    out.push_str(&format!("  {} {}\n", unit.ic, unit.dc));

    for (i, word) in unit.instruction_image.iter().enumerate() {
        let address = crate::translation_unit::STARTING_ADDRESS + i as i32;
        out.push_str(&format!("0{} {}\n", address, encode_base4(*word)));
    }

    let data_base = unit.data_base_address();
    for (i, word) in unit.data_image.iter().enumerate() {
        let address = data_base + i as i32;
        out.push_str(&format!("0{} {}\n", address, encode_base4(*word)));
    }

    out
}

/// `<stem>.ent`, one line per entry in entries-list order. `None` when
/// there are no entries — the caller should not write the file at all.
pub fn entries_file(unit: &TranslationUnit) -> Option<String> {
    if unit.entries.is_empty() {
        return None;
    }
    let mut out = String::new();
    for (name, address) in unit.entries.iter() {
        out.push_str(&format!("{}\t0{}\n", name, address));
    }
    Some(out)
}

/// `<stem>.ext`, one line per (external symbol, reference address) pair.
/// `None` when there are no external references.
pub fn externals_file(unit: &TranslationUnit) -> Option<String> {
    if unit.externals.is_empty() {
        return None;
    }
    let mut out = String::new();
    for external in unit.externals.iter() {
        for address in &external.addresses {
            out.push_str(&format!("{}\t0{}\n", external.name, address));
        }
    }
    Some(out)
}
