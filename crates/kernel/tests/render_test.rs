#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for region rendering.
//!
//! Builds the fixture site and checks the HTML each tile produces.

mod common;

use dom_bootstrap::permissions::UserContext;

use common::{TestSite, editor, fixtures_dir, memory_site};

/// Test the collapsible main menu on a page inside the About section.
#[test]
fn collapsible_menu_expands_active_trail() {
    let site = memory_site();
    let html = site
        .render_region("sidebar", "/about/team", &UserContext::anonymous())
        .expect("failed to render sidebar");

    assert!(html.contains("class=\"tile tile--dom-bootstrap-collapsible-menu\""));
    assert!(html.contains("id=\"tile-nav\""));

    // About holds Team, so it collapses Team behind a toggle that starts open
    assert!(html.contains("collapsible-links active"));
    assert!(html.contains("id=\"collapsible-nav-about\""));
    assert!(html.contains("collapse show"));
    assert!(html.contains("<a href=\"/about/team\">Team</a>"));

    // Leaf items link directly and carry their system path
    assert!(html.contains("data-drupal-link-system-path=\"contact\""));
    assert!(html.contains("data-drupal-link-system-path=\"&lt;front&gt;\""));

    let home = html.find(">Home<").expect("home link");
    let about = html.find(">About<").expect("about toggle");
    let contact = html.find(">Contact<").expect("contact link");
    assert!(home < about && about < contact);
}

/// Test that items off the active trail start collapsed.
#[test]
fn collapsible_menu_collapses_inactive_parents() {
    let site = memory_site();
    let html = site
        .render_region("sidebar", "/contact", &UserContext::anonymous())
        .unwrap();

    assert!(html.contains("collapsible-links__title collapsed"));
    assert!(html.contains("aria-expanded=\"false\""));
    assert!(!html.contains("collapse show"));
}

/// Test the account menu with the delimiter tap and role visibility.
#[test]
fn account_menu_gets_delimiter_for_authenticated_users() {
    let site = memory_site();

    let anonymous = site
        .render_region("sidebar", "/about", &UserContext::anonymous())
        .unwrap();
    assert!(!anonymous.contains("id=\"tile-account\""));

    let html = site.render_region("sidebar", "/about", &editor(&site)).unwrap();
    assert!(html.contains("id=\"tile-account\""));

    let settings = html.find(">Settings<").expect("settings link");
    let hr = html.find("<hr />").expect("delimiter");
    let logout = html.find(">Log out<").expect("logout link");
    assert!(settings < hr && hr < logout);

    // "My account" is expanded, so its links show without being in the trail
    let account = &html[html.find("id=\"tile-account\"").unwrap()..];
    assert!(account.contains("collapse show"));
}

/// Test the text logo with the mobile icon.
#[test]
fn text_logo_renders_both_parts_and_icon() {
    let site = memory_site();
    let html = site
        .render_region("header", "/", &UserContext::anonymous())
        .unwrap();

    assert!(html.contains("id=\"tile-logo\""));
    assert!(html.contains(">DOM</span>"));
    assert!(html.contains(">bootstrap</span>"));
    assert!(html.contains("fw-bold"));
    assert!(html.contains("fw-lighter"));
    assert!(html.contains("d-md-inline"));
    assert!(html.contains("<i class=\"bi bi-house h4 d-md-none\" aria-hidden=\"true\"></i>"));
    assert!(html.find(">DOM<").unwrap() < html.find(">bootstrap<").unwrap());
}

/// Test primary tabs on a page without secondary tabs.
#[test]
fn tabs_show_primary_level() {
    let site = memory_site();
    let html = site
        .render_region("content", "/node/1", &UserContext::anonymous())
        .unwrap();

    assert!(html.contains("id=\"tile-tabs\""));
    assert!(html.contains("id=\"collapsible-tabs-primary\""));
    assert!(html.contains("col-4 col-md-auto"));
    assert!(html.contains("href=\"/node/1\" class=\"nav-link active\""));
    assert!(html.contains("href=\"/node/1/revisions\""));
    // Editing needs a permission anonymous users lack
    assert!(!html.contains("/node/1/edit"));
    assert!(!html.contains("collapsible-tabs-secondary"));
}

/// Test that secondary tabs take the active primary tab's title.
#[test]
fn tabs_show_secondary_level() {
    let site = memory_site();
    let html = site
        .render_region("content", "/node/1/revisions/diff", &editor(&site))
        .unwrap();

    assert!(html.contains("href=\"/node/1/edit\""));
    assert!(html.contains("id=\"collapsible-tabs-secondary\""));
    assert!(html.contains("href=\"/node/1/revisions/diff\" class=\"nav-link active\""));

    // Secondary tabs render first
    let secondary = html.find("collapsible-tabs-secondary").unwrap();
    let primary = html.find("collapsible-tabs-primary").unwrap();
    assert!(secondary < primary);
    let secondary_html = &html[secondary..primary];
    assert!(secondary_html.contains(">Revisions</a>"));
    assert!(secondary_html.contains(">List</a>"));
    assert!(!secondary_html.contains(">Edit</a>"));
}

/// Test that path visibility keeps tabs off other pages.
#[test]
fn tabs_hidden_outside_node_pages() {
    let site = memory_site();
    let html = site
        .render_region("content", "/about", &UserContext::anonymous())
        .unwrap();
    assert!(html.is_empty());
}

/// Test theme suggestions narrowed to a placement.
#[test]
fn placement_template_overrides_builtin() {
    let test = TestSite::new("templates");
    let site = test.reload_with_templates(&fixtures_dir().join("templates"));

    let html = site
        .render_region("sidebar", "/about", &UserContext::anonymous())
        .unwrap();
    assert!(html.contains("<nav class=\"custom-nav\">About</nav>"));
    assert!(!html.contains("collapsible-links"));
}

/// Test that unknown users are rejected rather than treated as anonymous.
#[test]
fn unknown_user_is_none() {
    let site = memory_site();
    assert!(site.user(Some("nobody")).is_none());
    assert!(!site.user(None).unwrap().authenticated);
}
