//! Format layouts and values for display (CLI output, logs).

use crate::descriptor::{VarIndex, VariableDescriptor};
use crate::layout::Layout;
use crate::value::Value;

/// `12` for byte variables, `12-3` for bits.
pub fn format_index(index: &VarIndex) -> String {
    index.to_string()
}

/// One table row: number, byte, bit, size, type, name.
pub fn format_descriptor_row(number: usize, d: &VariableDescriptor) -> String {
    let bit = d
        .bit_index()
        .map_or_else(|| "-".to_string(), |b| b.to_string());
    format!(
        "{:>4}  {:>6}  {:>3}  {:>4}  {:<6}  {}",
        number,
        d.byte_index(),
        bit,
        d.size_bytes(),
        d.type_tag(),
        d.name()
    )
}

/// Header, one row per variable, and a trailing total line.
pub fn format_layout(layout: &Layout) -> String {
    let mut out = format!(
        "{:>4}  {:>6}  {:>3}  {:>4}  {:<6}  {}\n",
        "#", "byte", "bit", "size", "type", "name"
    );
    for (number, d) in layout.iter().enumerate() {
        out.push_str(&format_descriptor_row(number, d));
        out.push('\n');
    }
    out.push_str(&format!(
        "total: {} variable(s), {} byte(s)\n",
        layout.len(),
        layout.image_size()
    ));
    out
}

/// Compact one-line layout: `name@index:type` separated by spaces.
pub fn format_layout_compact(layout: &Layout) -> String {
    layout
        .iter()
        .map(|d| format!("{}@{}:{}", d.name(), format_index(&d.index()), d.type_tag()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display form of a value: shortest round-trip floats, bits as 0/1.
pub fn format_value(v: &Value) -> String {
    match v {
        Value::F32(x) => format!("{:?}", x),
        Value::F64(x) => format!("{:?}", x),
        _ => v.to_string(),
    }
}
