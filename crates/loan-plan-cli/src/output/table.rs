use colored::Colorize;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Schedule row fields and their column headers, in display order.
const ROW_COLUMNS: [(&str, &str); 9] = [
    ("period", "#"),
    ("opening_balance", "Opening"),
    ("pure_installment", "Installment"),
    ("interest", "Interest"),
    ("amortization", "Amortization"),
    ("fixed_fee", "Fee"),
    ("tax", "Tax"),
    ("total_payment", "Total"),
    ("closing_balance", "Closing"),
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result(result, map),
            None => print_flat_object(value),
        },
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    if result.get("rows").is_some() {
        print_schedule(result);
    } else if let Some(status) = result.get("status").and_then(Value::as_str) {
        if status == "not_found" {
            let message = result
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("No plan found");
            println!("{}", message.red().bold());
            if let Some(lowest) = result.get("lowest_mean_payment") {
                println!("Lowest mean installment in range: {}", format_value(lowest));
            }
        } else {
            print_candidates(result);
            if let Some(schedule) = envelope.get("best_schedule").filter(|s| !s.is_null()) {
                println!("\nSchedule for the optimal plan:");
                print_schedule(schedule);
            }
        }
    } else {
        print_flat_object(result);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_schedule(schedule: &Value) {
    if let Some(Value::Array(rows)) = schedule.get("rows") {
        let mut builder = Builder::default();
        builder.push_record(ROW_COLUMNS.iter().map(|(_, header)| *header));
        for row in rows {
            builder.push_record(ROW_COLUMNS.iter().map(|(field, _)| {
                row.get(*field).map(format_value).unwrap_or_default()
            }));
        }
        println!("{}", Table::from(builder));
    }

    if let Some(summary) = schedule.get("summary") {
        println!();
        print_flat_object(summary);
    }
}

fn print_candidates(result: &Value) {
    let best_count = result.pointer("/best/period_count").and_then(Value::as_u64);

    if let Some(Value::Array(candidates)) = result.get("candidates") {
        let mut builder = Builder::default();
        builder.push_record(["", "Installments", "Mean payment", "CFT %"]);
        for c in candidates {
            let count = c.get("period_count").and_then(Value::as_u64);
            let marker = if count.is_some() && count == best_count { "*" } else { "" };
            builder.push_record([
                marker.to_string(),
                c.get("period_count").map(format_value).unwrap_or_default(),
                c.get("mean_total_payment").map(format_value).unwrap_or_default(),
                c.get("annual_cost_rate_pct").map(format_value).unwrap_or_default(),
            ]);
        }
        println!("{}", Table::from(builder));
    }

    if let Some(best) = result.get("best") {
        println!(
            "{} {} installments of {} (CFT {}%)",
            "Optimal plan:".green().bold(),
            best.get("period_count").map(format_value).unwrap_or_default(),
            best.get("mean_total_payment").map(format_value).unwrap_or_default(),
            best.get("annual_cost_rate_pct").map(format_value).unwrap_or_default(),
        );
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

/// Decimal strings are shown to two places; everything else verbatim.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => match s.parse::<Decimal>() {
            Ok(d) => d.round_dp(2).to_string(),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_round_to_cents() {
        assert_eq!(format_value(&json!("441485.893817")), "441485.89");
        assert_eq!(format_value(&json!("12")), "12");
    }

    #[test]
    fn test_plain_strings_pass_through() {
        assert_eq!(format_value(&json!("optimal")), "optimal");
        assert_eq!(format_value(&json!(48)), "48");
    }
}
