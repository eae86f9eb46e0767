use time::{macros::format_description, OffsetDateTime};

use crate::auth::dto::RegisterRequest;
use crate::calculations::repo_types::Calculation;
use crate::calculations::services::{expression, format_inputs, format_number, CalculationType};

const LAYOUT: &str = include_str!("../../templates/layout.html");
const NAV_USER: &str = include_str!("../../templates/nav_user.html");
const NAV_GUEST: &str = include_str!("../../templates/nav_guest.html");
const REGISTER: &str = include_str!("../../templates/register.html");
const LOGIN: &str = include_str!("../../templates/login.html");
const DASHBOARD: &str = include_str!("../../templates/dashboard.html");
const VIEW: &str = include_str!("../../templates/view.html");
const EDIT: &str = include_str!("../../templates/edit.html");
const ERROR_STATE: &str = include_str!("../../templates/error_state.html");

pub const APP_JS: &str = include_str!("../../static/app.js");

/// Substitutes `{{name}}` placeholders in a single pass, so values are never
/// re-scanned. Unknown placeholders are kept verbatim.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    ts.to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_else(|_| ts.to_string())
}

fn error_alert(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!(
            r#"<div id="errorAlert" class="alert alert-error" role="alert">{}</div>"#,
            escape_html(msg)
        ),
        None => r#"<div id="errorAlert" class="alert alert-error" role="alert" hidden></div>"#
            .to_string(),
    }
}

fn type_options(selected: CalculationType) -> String {
    CalculationType::ALL
        .iter()
        .map(|kind| {
            let sel = if *kind == selected { " selected" } else { "" };
            format!(
                r#"      <option value="{}"{}>{}</option>"#,
                kind.as_str(),
                sel,
                kind.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `username` is `None` on the anonymous pages.
fn page(title: &str, username: Option<&str>, content: &str) -> String {
    let nav = match username {
        Some(name) => render(NAV_USER, &[("username", &escape_html(name))]),
        None => NAV_GUEST.to_string(),
    };
    render(
        LAYOUT,
        &[("title", &escape_html(title)), ("nav", &nav), ("content", content)],
    )
}

pub fn register_page(form: &RegisterRequest, error: Option<&str>) -> String {
    let content = render(
        REGISTER,
        &[
            ("error_alert", &error_alert(error)),
            ("first_name", &escape_html(&form.first_name)),
            ("last_name", &escape_html(&form.last_name)),
            ("email", &escape_html(&form.email)),
            ("username", &escape_html(&form.username)),
        ],
    );
    page("Register", None, &content)
}

pub fn login_page(username: &str, error: Option<&str>) -> String {
    let content = render(
        LOGIN,
        &[
            ("error_alert", &error_alert(error)),
            ("username", &escape_html(username)),
        ],
    );
    page("Login", None, &content)
}

pub fn calculation_row(calc: &Calculation) -> String {
    let id = calc.id.to_string();
    format!(
        r#"      <tr data-id="{id}">
        <td>{label}</td>
        <td>{inputs}</td>
        <td class="result">{result}</td>
        <td>{created}</td>
        <td class="actions">
          <a class="btn btn-small" href="/dashboard/view/{id}">View</a>
          <a class="btn btn-small" href="/dashboard/edit/{id}">Edit</a>
          <button type="button" class="btn btn-small btn-danger delete-btn" data-id="{id}">Delete</button>
        </td>
      </tr>"#,
        label = calc.kind.label(),
        inputs = escape_html(&format_inputs(&calc.inputs)),
        result = escape_html(&format_number(calc.result)),
        created = format_timestamp(calc.created_at),
    )
}

pub fn calculation_rows(calcs: &[Calculation]) -> String {
    calcs
        .iter()
        .map(calculation_row)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn dashboard_page(username: &str, calcs: &[Calculation]) -> String {
    let empty_hidden = if calcs.is_empty() { "" } else { " hidden" };
    let content = render(
        DASHBOARD,
        &[
            ("type_options", &type_options(CalculationType::Addition)),
            ("rows", &calculation_rows(calcs)),
            ("empty_hidden", empty_hidden),
        ],
    );
    page("Dashboard", Some(username), &content)
}

pub fn view_page(username: &str, calc: &Calculation) -> String {
    let content = render(
        VIEW,
        &[
            ("id", &calc.id.to_string()),
            ("type_label", calc.kind.label()),
            ("inputs", &escape_html(&format_inputs(&calc.inputs))),
            ("expression", &escape_html(&expression(calc.kind, &calc.inputs))),
            ("result", &escape_html(&format_number(calc.result))),
            ("created_at", &format_timestamp(calc.created_at)),
            ("updated_at", &format_timestamp(calc.updated_at)),
        ],
    );
    page("Calculation", Some(username), &content)
}

pub fn edit_page(username: &str, calc: &Calculation) -> String {
    let content = render(
        EDIT,
        &[
            ("id", &calc.id.to_string()),
            ("type_options", &type_options(calc.kind)),
            ("inputs", &escape_html(&format_inputs(&calc.inputs))),
            ("result", &escape_html(&format_number(calc.result))),
        ],
    );
    page("Edit calculation", Some(username), &content)
}

pub fn error_page(username: Option<&str>, heading: &str, message: &str) -> String {
    let content = render(
        ERROR_STATE,
        &[
            ("heading", &escape_html(heading)),
            ("message", &escape_html(message)),
        ],
    );
    page(heading, username, &content)
}
