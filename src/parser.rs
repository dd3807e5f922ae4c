//! Parse variable declaration files into [`Declaration`]s using PEST.
//!
//! The format is line oriented:
//!
//! ```text
//! [Variables]
//! Name_0=mode
//! Type_0=u8
//! Name_1=signal_on
//! Type_1=bit
//! ```
//!
//! `<n>` is the zero-based declaration number. The first key mentioning `<n>` creates the
//! declaration, and `<n>` may never skip ahead of the number of declarations seen so far.
//! A later key for an existing `<n>` updates it in place.

use std::path::Path;

use log::debug;
use pest::Parser;
use pest_derive::Parser as PestParser;

use crate::error::{Error, Result};
use crate::layout::{build_layout, Declaration, Layout};
use crate::types::{TypeRegistry, TypeTag};

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct VariablesParser;

#[derive(Default)]
struct PendingDeclaration {
    name: String,
    type_tag: Option<TypeTag>,
}

/// Parse declaration source into an ordered list of declarations.
pub fn parse_declarations(source: &str) -> Result<Vec<Declaration>> {
    let file = VariablesParser::parse(Rule::file, source)
        .map_err(|e| Error::Parse(e.to_string()))?
        .next()
        .ok_or_else(|| Error::Parse("empty parse".to_string()))?;

    let mut pending: Vec<PendingDeclaration> = Vec::new();
    for entry in file.into_inner() {
        if entry.as_rule() != Rule::entry {
            continue;
        }
        let mut inner = entry.into_inner();
        let (param, number, value) = match (inner.next(), inner.next(), inner.next()) {
            (Some(p), Some(n), Some(v)) => (p, n, v),
            _ => return Err(Error::Parse("entry: expected key, number and value".to_string())),
        };
        let number: usize = number
            .as_str()
            .parse()
            .map_err(|e| Error::Parse(format!("declaration number {:?}: {}", number.as_str(), e)))?;
        if number > pending.len() {
            return Err(Error::OutOfOrderDeclaration {
                expected: pending.len(),
                found: number,
            });
        }
        if number == pending.len() {
            pending.push(PendingDeclaration::default());
        }
        let value = value.as_str().trim();
        let decl = &mut pending[number];
        match param.as_str() {
            "Name" => decl.name = value.to_string(),
            _ => decl.type_tag = Some(TypeRegistry::lookup(value)?),
        }
    }

    pending
        .into_iter()
        .enumerate()
        .map(|(number, p)| {
            p.type_tag
                .map(|t| Declaration::new(number, p.name, t))
                .ok_or(Error::MissingType(number))
        })
        .collect()
}

/// Parse declaration source and resolve its layout.
pub fn load_layout(source: &str) -> Result<Layout> {
    let declarations = parse_declarations(source)?;
    build_layout(&declarations)
}

/// Read a declaration file and resolve its layout.
pub fn load_layout_file(path: impl AsRef<Path>) -> Result<Layout> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let layout = load_layout(&source)?;
    debug!(
        "{}: {} variable(s), {} byte(s)",
        path.display(),
        layout.len(),
        layout.image_size()
    );
    Ok(layout)
}
