use serde::Serialize;
use serde_json::{Number, Value};

use crate::records::Record;

/// Dashboard summary derived from staff, students and finance payments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub professeurs_presents: usize,
    pub total_professeurs: usize,
    pub total_eleves: usize,
    pub eleves_insolvables: usize,
    pub total_percu: Number,
}

pub fn compute_stats(professeurs: &[Record], eleves: &[Record], finances: &[Record]) -> Stats {
    let total: f64 = finances.iter().map(amount_paid).sum();
    Stats {
        professeurs_presents: professeurs.iter().filter(|p| is_present(p)).count(),
        total_professeurs: professeurs.len(),
        total_eleves: eleves.len(),
        eleves_insolvables: eleves
            .iter()
            .filter(|e| str_field(e, "statut_financier") == Some("insolvable"))
            .count(),
        total_percu: to_json_number(total),
    }
}

fn is_present(prof: &Record) -> bool {
    str_field(prof, "presence_effective") == Some("oui") || str_field(prof, "statut") == Some("actif")
}

fn str_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// `montant_paye`, falling back to `montantPaye`, coerced to a number. Anything non-numeric counts as 0.
fn amount_paid(payment: &Record) -> f64 {
    let raw = ["montant_paye", "montantPaye"]
        .iter()
        .filter_map(|k| payment.get(*k))
        .find(|v| !is_blank(v));
    raw.map(coerce_amount).unwrap_or(0.0)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn coerce_amount(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite()).unwrap_or(0.0)
}

fn to_json_number(total: f64) -> Number {
    if total.fract() == 0.0 && total.abs() < i64::MAX as f64 {
        Number::from(total as i64)
    } else {
        Number::from_f64(total).unwrap_or_else(|| Number::from(0))
    }
}
