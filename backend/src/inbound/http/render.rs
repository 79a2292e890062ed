//! Escaped-HTML rendering for the console pages.
//!
//! Deliberately engine-free: every page is a small, fully escaped string
//! built from the domain values the handler already holds. Layout carries
//! no styling beyond class names.

use crate::domain::{FormErrors, Gender, ListQuery, PageMeta, User, UserForm};
use crate::inbound::http::session::Flash;

/// Everything the list page needs.
pub struct ListPage<'a> {
    /// Users on the current page.
    pub users: &'a [User],
    /// Pagination metadata (defaulted when the upstream was unreachable).
    pub meta: PageMeta,
    /// Normalized query, echoed into the filter form and links.
    pub query: &'a ListQuery,
    /// Pending flash messages.
    pub flashes: &'a [Flash],
    /// Anti-forgery token for the import form.
    pub import_token: &'a str,
    /// Anti-forgery tokens for the per-row delete forms, parallel to
    /// `users`.
    pub delete_tokens: &'a [String],
}

/// Which user form is being rendered.
#[derive(Debug, Clone, Copy)]
pub enum UserFormMode {
    /// Creating a new user at `POST /users/new`.
    New,
    /// Editing an existing user at `POST /users/{id}/edit`.
    Edit {
        /// Upstream id of the user being edited.
        id: i64,
    },
}

impl UserFormMode {
    fn title(self) -> &'static str {
        match self {
            Self::New => "New User",
            Self::Edit { .. } => "Edit User",
        }
    }

    fn action(self) -> String {
        match self {
            Self::New => "/users/new".to_owned(),
            Self::Edit { id } => format!("/users/{id}/edit"),
        }
    }
}

/// Everything the new/edit form page needs.
pub struct UserFormPage<'a> {
    /// Create or edit.
    pub mode: UserFormMode,
    /// Submitted (or pre-filled) values, re-displayed verbatim.
    pub form: &'a UserForm,
    /// Field and form-level errors to render inline.
    pub errors: &'a FormErrors,
    /// Anti-forgery token for the form.
    pub token: &'a str,
    /// Pending flash messages.
    pub flashes: &'a [Flash],
}

const LIST_COLUMNS: [(&str, &str); 5] = [
    ("id", "Id"),
    ("first_name", "First name"),
    ("last_name", "Last name"),
    ("birthdate", "Birthdate"),
    ("gender", "Gender"),
];

/// Render the list page with filters, table, pagination, and import form.
pub fn list_page(page: &ListPage<'_>) -> String {
    let mut body = String::new();
    body.push_str("<h1>User List</h1>\n");
    body.push_str(&filter_form(page.query));
    body.push_str(&users_table(page));
    body.push_str(&pagination(page.meta, page.query));
    body.push_str(&format!(
        "<form method=\"post\" action=\"/users/import\" class=\"import\">\n\
         <input type=\"hidden\" name=\"_token\" value=\"{token}\">\n\
         <button type=\"submit\">Import users</button>\n\
         </form>\n",
        token = escape(page.import_token),
    ));
    body.push_str("<p><a href=\"/users/new\">New user</a></p>\n");
    layout("User List", page.flashes, &body)
}

/// Render the new/edit user form page.
pub fn user_form_page(page: &UserFormPage<'_>) -> String {
    let title = page.mode.title();
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", escape(title)));
    body.push_str(&form_level_errors(page.errors));
    body.push_str(&format!(
        "<form method=\"post\" action=\"{action}\" class=\"user-form\">\n\
         <input type=\"hidden\" name=\"_token\" value=\"{token}\">\n",
        action = escape(&page.mode.action()),
        token = escape(page.token),
    ));
    body.push_str(&text_field(
        "first_name",
        "First name",
        "text",
        page.form,
        page.errors,
    ));
    body.push_str(&text_field(
        "last_name",
        "Last name",
        "text",
        page.form,
        page.errors,
    ));
    body.push_str(&text_field(
        "birthdate",
        "Birthdate",
        "date",
        page.form,
        page.errors,
    ));
    body.push_str(&gender_field(page.form, page.errors));
    body.push_str("<button type=\"submit\">Save</button>\n</form>\n");
    body.push_str("<p><a href=\"/users\">Back to list</a></p>\n");
    layout(title, page.flashes, &body)
}

/// Render a minimal error page for failures that cannot reach a console
/// page.
pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        &[],
        &format!("<h1>Error</h1>\n<p>{}</p>\n", escape(message)),
    )
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body>\n{flashes}{body}</body>\n\
         </html>\n",
        title = escape(title),
        flashes = flash_block(flashes),
    )
}

fn flash_block(flashes: &[Flash]) -> String {
    let mut block = String::new();
    for flash in flashes {
        block.push_str(&format!(
            "<div class=\"flash {class}\">{message}</div>\n",
            class = flash.level.css_class(),
            message = escape(&flash.message),
        ));
    }
    block
}

fn filter_form(query: &ListQuery) -> String {
    let gender_options = gender_select(query.get("gender").unwrap_or_default(), true);
    format!(
        "<form method=\"get\" action=\"/users\" class=\"filters\">\n\
         <label>First name <input type=\"text\" name=\"first_name\" value=\"{first_name}\"></label>\n\
         <label>Last name <input type=\"text\" name=\"last_name\" value=\"{last_name}\"></label>\n\
         <label>Gender <select name=\"gender\">{gender_options}</select></label>\n\
         <label>Born after <input type=\"date\" name=\"birthdate_from\" value=\"{from}\"></label>\n\
         <label>Born before <input type=\"date\" name=\"birthdate_to\" value=\"{to}\"></label>\n\
         <button type=\"submit\">Filter</button>\n\
         </form>\n",
        first_name = escape(query.get("first_name").unwrap_or_default()),
        last_name = escape(query.get("last_name").unwrap_or_default()),
        from = escape(query.get("birthdate_from").unwrap_or_default()),
        to = escape(query.get("birthdate_to").unwrap_or_default()),
    )
}

fn gender_select(selected: &str, with_placeholder: bool) -> String {
    let mut options = String::new();
    if with_placeholder {
        options.push_str("<option value=\"\">All</option>");
    } else {
        options.push_str("<option value=\"\"></option>");
    }
    for gender in Gender::ALL {
        let marker = if gender.as_str() == selected {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            "<option value=\"{value}\"{marker}>{label}</option>",
            value = gender.as_str(),
            label = gender.label(),
        ));
    }
    options
}

fn users_table(page: &ListPage<'_>) -> String {
    let mut table = String::new();
    table.push_str("<table class=\"users\">\n<thead>\n<tr>");
    for (key, label) in LIST_COLUMNS {
        table.push_str(&format!("<th>{}</th>", sort_link(key, label, page.query)));
    }
    table.push_str("<th>Actions</th></tr>\n</thead>\n<tbody>\n");
    for (user, delete_token) in page.users.iter().zip(page.delete_tokens) {
        table.push_str(&user_row(user, delete_token));
    }
    table.push_str("</tbody>\n</table>\n");
    table.push_str(&format!(
        "<p class=\"meta\">{count} users</p>\n",
        count = page.meta.total_count,
    ));
    table
}

fn user_row(user: &User, delete_token: &str) -> String {
    format!(
        "<tr>\
         <td>{id}</td>\
         <td>{first_name}</td>\
         <td>{last_name}</td>\
         <td>{birthdate}</td>\
         <td>{gender}</td>\
         <td><a href=\"/users/{id}/edit\">Edit</a> \
         <form method=\"post\" action=\"/users/{id}/delete\" class=\"delete\">\
         <input type=\"hidden\" name=\"_token\" value=\"{token}\">\
         <button type=\"submit\">Delete</button>\
         </form></td>\
         </tr>\n",
        id = user.id,
        first_name = escape(&user.first_name),
        last_name = escape(&user.last_name),
        birthdate = escape(&user.birthdate),
        gender = user.gender.as_str(),
        token = escape(delete_token),
    )
}

fn sort_link(column: &str, label: &str, query: &ListQuery) -> String {
    let direction = if query.sort() == column && query.direction() == "asc" {
        "desc"
    } else {
        "asc"
    };
    let mut pairs: Vec<(&str, &str)> = query.filters().collect();
    pairs.push(("sort", column));
    pairs.push(("direction", direction));
    format!(
        "<a href=\"/users?{query_string}\">{label}</a>",
        query_string = escape(&query_string(pairs)),
        label = escape(label),
    )
}

fn pagination(meta: PageMeta, query: &ListQuery) -> String {
    let total_pages = meta.total_pages();
    if total_pages <= 1 {
        return String::new();
    }
    let mut nav = String::from("<nav class=\"pagination\">\n");
    for page in 1..=total_pages {
        if page == u64::from(meta.page) {
            nav.push_str(&format!("<strong>{page}</strong>\n"));
        } else {
            let page_value = page.to_string();
            let mut pairs: Vec<(&str, &str)> = query.filters().collect();
            pairs.push(("sort", query.sort()));
            pairs.push(("direction", query.direction()));
            pairs.push(("page", &page_value));
            nav.push_str(&format!(
                "<a href=\"/users?{query_string}\">{page}</a>\n",
                query_string = escape(&query_string(pairs)),
            ));
        }
    }
    nav.push_str("</nav>\n");
    nav
}

fn text_field(
    name: &str,
    label: &str,
    input_type: &str,
    form: &UserForm,
    errors: &FormErrors,
) -> String {
    format!(
        "<div class=\"field\">\n\
         <label>{label} <input type=\"{input_type}\" name=\"{name}\" value=\"{value}\"></label>\n\
         {errors}</div>\n",
        label = escape(label),
        value = escape(form.value(name)),
        errors = field_errors(name, errors),
    )
}

fn gender_field(form: &UserForm, errors: &FormErrors) -> String {
    format!(
        "<div class=\"field\">\n\
         <label>Gender <select name=\"gender\">{options}</select></label>\n\
         {errors}</div>\n",
        options = gender_select(form.value("gender"), false),
        errors = field_errors("gender", errors),
    )
}

fn field_errors(name: &str, errors: &FormErrors) -> String {
    let messages = errors.field(name);
    if messages.is_empty() {
        return String::new();
    }
    let mut list = format!("<ul class=\"field-errors\" data-field=\"{}\">", escape(name));
    for message in messages {
        list.push_str(&format!("<li>{}</li>", escape(message)));
    }
    list.push_str("</ul>\n");
    list
}

fn form_level_errors(errors: &FormErrors) -> String {
    let messages = errors.form();
    if messages.is_empty() {
        return String::new();
    }
    let mut list = String::from("<ul class=\"form-errors\">");
    for message in messages {
        list.push_str(&format!("<li>{}</li>", escape(message)));
    }
    list.push_str("</ul>\n");
    list
}

fn query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListParams, UserPage};
    use crate::inbound::http::session::FlashLevel;
    use crate::inbound::http::test_utils::sample_user;

    fn default_query() -> ListQuery {
        ListQuery::from_params(&ListParams::default())
    }

    #[test]
    fn list_page_renders_one_row_per_user() {
        let user = sample_user(1);
        let tokens = vec!["tok-1".to_owned()];
        let query = default_query();
        let html = list_page(&ListPage {
            users: std::slice::from_ref(&user),
            meta: PageMeta {
                total_count: 1,
                page: 1,
                page_size: 10,
            },
            query: &query,
            flashes: &[],
            import_token: "import-tok",
            delete_tokens: &tokens,
        });

        assert!(html.contains("<h1>User List</h1>"));
        assert_eq!(html.matches("<tr><td>").count(), 1);
        assert!(html.contains("<td>Jan</td>"));
        assert!(html.contains("<td>Kowalski</td>"));
        assert!(html.contains("/users/1/edit"));
        assert!(html.contains("/users/1/delete"));
    }

    #[test]
    fn list_page_escapes_user_content() {
        let mut user = sample_user(1);
        user.first_name = "<script>alert(1)</script>".to_owned();
        let tokens = vec!["tok".to_owned()];
        let query = default_query();
        let html = list_page(&ListPage {
            users: std::slice::from_ref(&user),
            meta: UserPage::empty().meta,
            query: &query,
            flashes: &[],
            import_token: "tok",
            delete_tokens: &tokens,
        });

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn flashes_render_with_their_level() {
        let query = default_query();
        let html = list_page(&ListPage {
            users: &[],
            meta: UserPage::empty().meta,
            query: &query,
            flashes: &[Flash {
                level: FlashLevel::Error,
                message: "Could not fetch users: boom".to_owned(),
            }],
            import_token: "tok",
            delete_tokens: &[],
        });

        assert!(html.contains("flash-error"));
        assert!(html.contains("Could not fetch users: boom"));
    }

    #[test]
    fn filter_values_are_echoed_back() {
        let query = ListQuery::from_params(&ListParams {
            first_name: Some("Jan".to_owned()),
            gender: Some("female".to_owned()),
            ..ListParams::default()
        });
        let html = list_page(&ListPage {
            users: &[],
            meta: UserPage::empty().meta,
            query: &query,
            flashes: &[],
            import_token: "tok",
            delete_tokens: &[],
        });

        assert!(html.contains("name=\"first_name\" value=\"Jan\""));
        assert!(html.contains("<option value=\"female\" selected>"));
    }

    #[test]
    fn sort_links_flip_direction_on_the_active_column() {
        let query = ListQuery::from_params(&ListParams::default());
        let html = list_page(&ListPage {
            users: &[],
            meta: UserPage::empty().meta,
            query: &query,
            flashes: &[],
            import_token: "tok",
            delete_tokens: &[],
        });

        // Active column (id, asc by default) links to desc; others to asc.
        assert!(html.contains(&format!(
            "href=\"/users?{}\"",
            escape("sort=id&direction=desc")
        )));
        assert!(html.contains(&format!(
            "href=\"/users?{}\"",
            escape("sort=last_name&direction=asc")
        )));
    }

    #[test]
    fn pagination_appears_only_beyond_one_page() {
        let query = default_query();
        let single = list_page(&ListPage {
            users: &[],
            meta: PageMeta {
                total_count: 10,
                page: 1,
                page_size: 10,
            },
            query: &query,
            flashes: &[],
            import_token: "tok",
            delete_tokens: &[],
        });
        assert!(!single.contains("class=\"pagination\""));

        let multiple = list_page(&ListPage {
            users: &[],
            meta: PageMeta {
                total_count: 25,
                page: 2,
                page_size: 10,
            },
            query: &query,
            flashes: &[],
            import_token: "tok",
            delete_tokens: &[],
        });
        assert!(multiple.contains("class=\"pagination\""));
        assert!(multiple.contains("<strong>2</strong>"));
        assert!(multiple.contains(&format!(
            "href=\"/users?{}\"",
            escape("sort=id&direction=asc&page=3")
        )));
    }

    #[test]
    fn form_page_shows_field_and_form_errors() {
        let mut errors = FormErrors::new();
        errors.add_field("first_name", "required");
        errors.add_form("base: nope");
        let form = UserForm::default();

        let html = user_form_page(&UserFormPage {
            mode: UserFormMode::New,
            form: &form,
            errors: &errors,
            token: "tok",
            flashes: &[],
        });

        assert!(html.contains("<h1>New User</h1>"));
        assert!(html.contains("data-field=\"first_name\""));
        assert!(html.contains("<li>required</li>"));
        assert!(html.contains("class=\"form-errors\""));
        assert!(html.contains("<li>base: nope</li>"));
        assert!(html.contains("action=\"/users/new\""));
    }

    #[test]
    fn edit_form_posts_back_to_the_user_and_prefills_values() {
        let user = sample_user(7);
        let form = UserForm::from_user(&user);
        let html = user_form_page(&UserFormPage {
            mode: UserFormMode::Edit { id: 7 },
            form: &form,
            errors: &FormErrors::new(),
            token: "tok",
            flashes: &[],
        });

        assert!(html.contains("<h1>Edit User</h1>"));
        assert!(html.contains("action=\"/users/7/edit\""));
        assert!(html.contains("value=\"Jan\""));
        assert!(html.contains("value=\"1990-01-01\""));
        assert!(html.contains("<option value=\"male\" selected>"));
    }

    #[test]
    fn error_page_escapes_the_message() {
        let html = error_page("<oops>");
        assert!(html.contains("&lt;oops&gt;"));
        assert!(!html.contains("<oops>"));
    }
}
