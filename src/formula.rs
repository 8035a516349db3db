use std::collections::BTreeMap;
use std::fmt::Write;

use crate::element::Element;
use crate::molecule::Molecule;

const KG_PER_G: f64 = 1e-3;

/// Average molecular weight in kg/mol.
pub fn molecular_weight(mol: &Molecule) -> f64 {
    let h_weight = Element::H.atomic_weight();
    let grams: f64 = mol
        .atoms()
        .filter_map(|idx| mol.atom(idx).ok())
        .map(|a| a.element.atomic_weight() + f64::from(a.implicit_hydrogens) * h_weight)
        .sum();
    grams * KG_PER_G
}

/// Molecular formula in the Hill system.
///
/// Carbon comes first, then hydrogen, then the remaining elements
/// alphabetically. Without carbon every element, hydrogen included, is
/// listed alphabetically. A net charge is appended as `+`, `2+`, `-`, `2-`.
pub fn formula(mol: &Molecule) -> String {
    let mut counts: BTreeMap<&'static str, u32> = BTreeMap::new();
    let mut net_charge: i32 = 0;
    for atom in mol.atoms().filter_map(|idx| mol.atom(idx).ok()) {
        *counts.entry(atom.element.symbol()).or_default() += 1;
        if atom.implicit_hydrogens > 0 {
            *counts.entry("H").or_default() += u32::from(atom.implicit_hydrogens);
        }
        net_charge += i32::from(atom.formal_charge);
    }

    let mut out = String::new();
    if let Some(c) = counts.remove("C") {
        append_element(&mut out, "C", c);
        if let Some(h) = counts.remove("H") {
            append_element(&mut out, "H", h);
        }
    }
    for (symbol, count) in &counts {
        append_element(&mut out, symbol, *count);
    }

    match net_charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        n if n > 0 => {
            let _ = write!(out, "{n}+");
        }
        n => {
            let _ = write!(out, "{}-", n.unsigned_abs());
        }
    }
    out
}

fn append_element(buf: &mut String, symbol: &str, count: u32) {
    buf.push_str(symbol);
    if count > 1 {
        let _ = write!(buf, "{count}");
    }
}

impl Molecule {
    pub fn formula(&self) -> String {
        formula(self)
    }

    pub fn molecular_weight(&self) -> f64 {
        molecular_weight(self)
    }
}
