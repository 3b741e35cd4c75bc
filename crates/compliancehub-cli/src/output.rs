use serde::Serialize;

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&JsonOut { ok: true, data })?
    );
    Ok(())
}

/// One line per item, or the whole list as JSON.
pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        print_json(data)
    } else {
        if data.is_empty() {
            println!("(none)");
        }
        for d in data {
            println!("{}", row(d));
        }
        Ok(())
    }
}

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    render: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        print_json(data)
    } else {
        println!("{}", render(&data));
        Ok(())
    }
}

/// A short confirmation, or `{"ok": true, "data": {"message": ...}}`.
pub fn print_done(json: bool, message: &str) -> anyhow::Result<()> {
    print_one(json, serde_json::json!({ "message": message }), |_| {
        message.to_string()
    })
}

/// The wire name of an enum value, as the API spells it.
pub fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => "?".to_string(),
    }
}

pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// `key: value` lines with the keys padded to one width.
pub fn fields(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{:width$}  {}", format!("{}:", k), v, width = width + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
