use crate::reconciler::{Reconciliation, Verdict};

/// Formats an amount with two decimals and comma thousands separators, e.g.
/// `3,810,692,646.12`.
pub fn format_amount(amount: f64) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    // Amounts that round to zero are printed without a sign.
    let negative = amount < 0.0 && rounded.bytes().any(|b| b != b'0' && b != b'.');
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, cents)
}

fn amount_line(lines: &mut Vec<String>, label: String, amount: f64) {
    lines.push(format!("{}: {}", label, format_amount(amount)));
}

/// Renders the reconciliation as `<label>: <amount>` lines for human
/// inspection.
pub fn render(reconciliation: &Reconciliation) -> String {
    let mut lines = Vec::new();

    for variant in &reconciliation.variants {
        let name = variant.name();
        amount_line(&mut lines, format!("{} HQ total", name), variant.totals.hq.total);
        amount_line(
            &mut lines,
            format!("{} satellite total", name),
            variant.totals.satellites.total,
        );
        amount_line(&mut lines, format!("{} total", name), variant.total());

        if let (Some(expected), Some(difference)) = (variant.expected, variant.difference()) {
            amount_line(&mut lines, format!("{} expected", name), expected);
            amount_line(&mut lines, format!("{} difference", name), difference);

            let check = match variant.verdict() {
                Verdict::Mismatch => "MISMATCH, outside tolerance of",
                _ => "within tolerance of",
            };
            lines.push(format!("{} check: {} {}", name, check, variant.tolerance));
        }
    }

    for cross in reconciliation.cross_differences() {
        amount_line(
            &mut lines,
            format!("{} vs {} difference", cross.left, cross.right),
            cross.difference,
        );
    }

    lines.join("\n")
}
