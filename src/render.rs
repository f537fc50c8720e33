// 🧾 Render - HTML for the ledger and gallery pages

use chrono::NaiveDate;

use crate::gallery::image_src;
use crate::ledger::{total_amount, Transaction};

// ============================================================================
// HELPERS
// ============================================================================

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Two decimals with `,` thousands separators: 1234.5 -> "1,234.50".
/// Halves round away from zero after trimming float noise, so 1.005 -> "1.01".
pub fn format_amount(amount: f64) -> String {
    let cents = round_cents(amount.abs());

    // at least three digits so there is always an integer part
    let digits = format!("{:03.0}", cents);
    let (int_part, frac_part) = digits.split_at(digits.len() - 2);

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Scale to cents, pre-round to 15 significant digits, then round half up
fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    let precise = format!("{:.14e}", scaled)
        .parse::<f64>()
        .unwrap_or(scaled);
    precise.round()
}

const BASE_STYLE: &str = "
        body {
            font-family: Arial, sans-serif;
            text-align: center;
            margin: 0;
            padding: 20px;
            background-color: #f8f8f8;
        }
        .header {
            font-size: 18px;
            font-weight: bold;
            padding: 10px;
            background-color: white;
            border: 1px solid #000;
            display: inline-block;
            margin-bottom: 20px;
        }";

const GALLERY_STYLE: &str = "
        .gallery {
            display: grid;
            grid-template-columns: repeat(3, 1fr);
            gap: 10px;
            max-width: 600px;
            margin: auto;
        }
        .gallery img {
            width: 100%;
            aspect-ratio: 1 / 1;
            border-radius: 10px;
            object-fit: cover;
            box-shadow: 2px 2px 5px rgba(0, 0, 0, 0.2);
        }
        .footer {
            margin-top: 20px;
            font-size: 14px;
            color: #555;
        }";

const LEDGER_STYLE: &str = "
        table {
            width: 80%;
            margin: auto;
            border-collapse: collapse;
            background: white;
        }
        th, td {
            border: 1px solid black;
            padding: 10px;
        }
        th {
            background: #ddd;
        }
        form {
            margin: 20px;
        }
        input, button {
            padding: 10px;
            margin: 5px;
        }
        .notice {
            color: #b00020;
        }";

fn document(lang: &str, title: &str, style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"{lang}\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title}</title>
    <style>{base}{style}
    </style>
</head>
<body>
{body}
</body>
</html>
",
        lang = lang,
        title = title,
        base = BASE_STYLE,
        style = style,
        body = body,
    )
}

// ============================================================================
// GALLERY PAGE
// ============================================================================

pub fn render_gallery_page(url_prefix: &str, files: &[String]) -> String {
    let images: String = files
        .iter()
        .map(|file| {
            format!(
                "    <img src=\"{}\" alt=\"Cat\">\n",
                escape_html(&image_src(url_prefix, file))
            )
        })
        .collect();

    let body = format!(
        "<div class=\"header\">
    About Cats | News | Contacts
</div>

<h2>#cats</h2>
<p style=\"color: gray;\">Explore a world of cats</p>

<div class=\"gallery\">
{images}</div>

<div class=\"footer\">
    2025
</div>",
        images = images
    );

    document("en", "Cat Gallery", GALLERY_STYLE, &body)
}

// ============================================================================
// LEDGER PAGE
// ============================================================================

/// Everything the ledger page shows for one request
#[derive(Debug, Clone)]
pub struct LedgerView<'a> {
    pub transactions: &'a [Transaction],
    pub search_results: &'a [Transaction],
    pub found_by_id: Option<&'a Transaction>,
    pub notice: Option<&'a str>,
    pub today: NaiveDate,
}

const TABLE_HEADER: &str = "<tr>
            <th>ID</th>
            <th>Date</th>
            <th>Amount</th>
            <th>Description</th>
            <th>Merchant</th>
            <th>Days Ago</th>
        </tr>";

fn transaction_row(tx: &Transaction, today: NaiveDate) -> String {
    format!(
        "        <tr>
            <td>{}</td>
            <td>{}</td>
            <td>{} $</td>
            <td>{}</td>
            <td>{}</td>
            <td>{}</td>
        </tr>
",
        tx.id,
        tx.date.format("%Y-%m-%d"),
        format_amount(tx.amount),
        escape_html(&tx.description),
        escape_html(&tx.merchant),
        tx.days_since(today),
    )
}

fn transaction_rows(transactions: &[Transaction], today: NaiveDate) -> String {
    transactions
        .iter()
        .map(|tx| transaction_row(tx, today))
        .collect()
}

fn ledger_table(transactions: &[Transaction], today: NaiveDate) -> String {
    format!(
        "<table>
    <thead>
        {header}
    </thead>
    <tbody>
{rows}    </tbody>
    <tfoot>
        <tr>
            <td colspan=\"5\"><strong>Total:</strong></td>
            <td><strong>{total} $</strong></td>
        </tr>
    </tfoot>
</table>",
        header = TABLE_HEADER,
        rows = transaction_rows(transactions, today),
        total = format_amount(total_amount(transactions)),
    )
}

fn search_results_section(results: &[Transaction], today: NaiveDate) -> String {
    if results.is_empty() {
        return "<p>No results found.</p>".to_string();
    }

    format!(
        "<table>
    <thead>
        {header}
    </thead>
    <tbody>
{rows}    </tbody>
</table>",
        header = TABLE_HEADER,
        rows = transaction_rows(results, today),
    )
}

fn found_by_id_section(found: Option<&Transaction>, today: NaiveDate) -> String {
    match found {
        Some(tx) => format!(
            "<table>
    {header}
{row}</table>",
            header = TABLE_HEADER,
            row = transaction_row(tx, today),
        ),
        None => "<p>No transaction found with this ID.</p>".to_string(),
    }
}

pub fn render_ledger_page(view: &LedgerView<'_>) -> String {
    let notice = view
        .notice
        .map(|msg| format!("<p class=\"notice\">{}</p>\n", escape_html(msg)))
        .unwrap_or_default();

    let body = format!(
        "<div class=\"header\">
    Transactions | <a href=\"?sort=date\">Sort by Date</a> | <a href=\"?sort=amount\">Sort by Amount</a>
</div>

<h2>Bank Transactions</h2>

<form method=\"POST\">
    <input type=\"text\" name=\"search\" placeholder=\"Search description...\">
    <button type=\"submit\">Find</button>
</form>

<form method=\"POST\">
    <input type=\"number\" name=\"search_id\" placeholder=\"Search by ID\">
    <button type=\"submit\">Find by ID</button>
</form>

{table}

<h2>Search Results</h2>
{results}

<h2>Search by ID Result</h2>
{by_id}

<h2>Add New Transaction</h2>
{notice}<form method=\"POST\">
    <input type=\"date\" name=\"date\" required>
    <input type=\"number\" step=\"0.01\" name=\"amount\" placeholder=\"Amount\" required>
    <input type=\"text\" name=\"description\" placeholder=\"Description\" required>
    <input type=\"text\" name=\"merchant\" placeholder=\"Merchant\" required>
    <button type=\"submit\" name=\"add\">Add Transaction</button>
</form>",
        table = ledger_table(view.transactions, view.today),
        results = search_results_section(view.search_results, view.today),
        by_id = found_by_id_section(view.found_by_id, view.today),
        notice = notice,
    );

    document("ru", "Bank Transactions", LEDGER_STYLE, &body)
}
