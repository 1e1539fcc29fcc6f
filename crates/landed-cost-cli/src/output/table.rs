use serde_json::Value;
use tabled::{Table, builder::Builder};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if map.contains_key("breakdown") {
                print_calc_table(map);
            } else if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

/// Calculation output: the line-item breakdown as rows, then a summary.
fn print_calc_table(map: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(items)) = map.get("breakdown") {
        let mut builder = Builder::default();
        builder.push_record(["Item", "Amount", "Formula"]);
        for item in items {
            if let Value::Object(line) = item {
                builder.push_record([
                    line.get("label").map(format_value).unwrap_or_default(),
                    line.get("amount").map(format_value).unwrap_or_default(),
                    line.get("formula").map(format_value).unwrap_or_default(),
                ]);
            }
        }
        let table = Table::from(builder);
        println!("{}", table);
    }

    let summary_keys = [
        "landed_cost_total",
        "landed_cost_ex_vat",
        "per_unit_cost",
        "currency",
        "tariff_version",
        "confidence",
    ];
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for key in &summary_keys {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                builder.push_record([*key, &format_value(val)]);
            }
        }
    }
    if let Some(Value::Object(risk)) = map.get("risk_assessment") {
        if let Some(score) = risk.get("overall_risk_score") {
            builder.push_record(["overall_risk_score", &format_value(score)]);
        }
    }
    let table = Table::from(builder);
    println!("\n{}", table);

    print_string_list(map, "warnings", "Warnings");
    print_string_list(map, "risk_notes", "Risk notes");
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    // Print the result section
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    print_string_list(envelope, "warnings", "Warnings");
}

fn print_string_list(map: &serde_json::Map<String, Value>, key: &str, heading: &str) {
    if let Some(Value::Array(items)) = map.get(key) {
        if !items.is_empty() {
            println!("\n{}:", heading);
            for item in items {
                if let Value::String(s) = item {
                    println!("  - {}", s);
                }
            }
        }
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
