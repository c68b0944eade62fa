use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Tried in order: the optimal installment count, the schedule's cost rate,
/// then the no-solution message.
pub fn print_minimal(value: &Value) {
    let priority_pointers = [
        "/result/best/period_count",
        "/result/summary/annual_cost_rate_pct",
        "/result/message",
    ];

    for pointer in &priority_pointers {
        if let Some(val) = value.pointer(pointer) {
            if !val.is_null() {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    println!("{}", format_minimal(value));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
