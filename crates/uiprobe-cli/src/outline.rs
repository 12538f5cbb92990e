//! Snapshot outline rendering
//!
//! ```text
//! ios sess-9d21f0aa7c3e4b10 (2 windows, 7 elements)
//! ├── window.main io.example.Login (0,0 1170x2532)
//! │   └── view (0,0 1170x2532) visible
//! │       ├── textField [id="email"] (60,600 1050x132) visible clickable focusable focused
//! ...
//! ```

use console::style;
use uiprobe::{Element, Rect, Tree, Window};

/// Outline rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineOptions {
    /// Deepest element depth to print; window roots are depth 0
    pub max_depth: Option<usize>,
    /// Emit ANSI styles
    pub color: bool,
}

/// Render the whole tree as an indented outline
#[must_use]
pub fn render_outline(tree: &Tree, options: OutlineOptions) -> String {
    let mut output = format!(
        "{} {} ({} windows, {} elements)\n",
        tree.os,
        display_session(&tree.session_id),
        tree.windows.len(),
        tree.element_count()
    );

    let len = tree.windows.len();
    for (i, window) in tree.windows.iter().enumerate() {
        let is_last = i + 1 == len;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };

        output.push_str(connector);
        output.push_str(&window_line(window, options.color));
        output.push('\n');
        render_elements(
            std::slice::from_ref(&window.root),
            0,
            child_prefix,
            options,
            &mut output,
        );
    }
    output
}

fn display_session(session_id: &str) -> &str {
    if session_id.is_empty() {
        "<no session>"
    } else {
        session_id
    }
}

fn render_elements(
    elements: &[Element],
    depth: usize,
    prefix: &str,
    options: OutlineOptions,
    output: &mut String,
) {
    if options.max_depth.is_some_and(|max| depth > max) {
        return;
    }

    let len = elements.len();
    for (i, element) in elements.iter().enumerate() {
        let is_last = i + 1 == len;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };

        output.push_str(prefix);
        output.push_str(connector);
        output.push_str(&element_line(element, options.color));
        output.push('\n');

        if !element.is_leaf() {
            let nested = format!("{prefix}{child_prefix}");
            render_elements(&element.children, depth + 1, &nested, options, output);
        }
    }
}

fn window_line(window: &Window, color: bool) -> String {
    let kind = if color {
        style(window.kind.as_str()).bold().to_string()
    } else {
        window.kind.as_str().to_string()
    };
    format!("{kind} {} {}", window.package_name, format_bounds(&window.bounds))
}

/// One outline line for an element: label, bounds, visibility and set flags
#[must_use]
pub fn element_line(element: &Element, color: bool) -> String {
    let label = if color {
        style(element.label()).cyan().to_string()
    } else {
        element.label()
    };
    let mut line = format!(
        "{label} {} {}",
        format_bounds(&element.bounds),
        element.visibility
    );
    let flags = flag_names(element);
    if !flags.is_empty() {
        let joined = flags.join(" ");
        line.push(' ');
        if color {
            line.push_str(&style(joined).dim().to_string());
        } else {
            line.push_str(&joined);
        }
    }
    line
}

/// `(x,y wxh)`
#[must_use]
pub fn format_bounds(bounds: &Rect) -> String {
    format!(
        "({},{} {}x{})",
        bounds.x, bounds.y, bounds.width, bounds.height
    )
}

fn flag_names(element: &Element) -> Vec<&'static str> {
    [
        (element.clickable, "clickable"),
        (element.long_clickable, "long-clickable"),
        (element.focusable, "focusable"),
        (element.focused, "focused"),
        (element.checkable, "checkable"),
        (element.checked, "checked"),
        (element.scrollable, "scrollable"),
        (element.password, "password"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use uiprobe::parse_tree;

    const IOS_LOGIN: &str = include_str!("../../uiprobe/fixtures/ios_login.xml");

    fn plain(max_depth: Option<usize>) -> OutlineOptions {
        OutlineOptions {
            max_depth,
            color: false,
        }
    }

    mod outline_tests {
        use super::*;

        #[test]
        fn test_header_line() {
            let tree = parse_tree(IOS_LOGIN).unwrap();
            let outline = render_outline(&tree, plain(None));
            assert!(outline.starts_with("ios sess-9d21f0aa7c3e4b10 (2 windows, 7 elements)\n"));
        }

        #[test]
        fn test_full_outline() {
            let tree = parse_tree(IOS_LOGIN).unwrap();
            let outline = render_outline(&tree, plain(None));
            let expected = "\
ios sess-9d21f0aa7c3e4b10 (2 windows, 7 elements)
├── window.main io.example.Login (0,0 1170x2532)
│   └── view (0,0 1170x2532) visible
│       ├── textField [id=\"email\"] (60,600 1050x132) visible clickable focusable focused
│       ├── secureTextField [id=\"password\"] (60,780 1050x132) visible clickable focusable password
│       └── button [text=\"Sign in\"] (60,980 1050x150) visible clickable
└── window.keyboard com.apple.keyboard (0,1620 1170x912)
    └── keyboard (0,1620 1170x912) visible
        ├── key [text=\"q\"] (6,1650 105x126) visible clickable
        └── key [text=\"return\"] (870,2220 294x126) visible clickable
";
            assert_eq!(outline, expected);
        }

        #[test]
        fn test_max_depth_zero_prints_roots_only() {
            let tree = parse_tree(IOS_LOGIN).unwrap();
            let outline = render_outline(&tree, plain(Some(0)));
            assert!(outline.contains("└── view"));
            assert!(!outline.contains("textField"));
            assert_eq!(outline.lines().count(), 5);
        }

        #[test]
        fn test_empty_tree() {
            let tree = parse_tree(r#"<tree osType="android"></tree>"#).unwrap();
            assert_eq!(
                render_outline(&tree, plain(None)),
                "android <no session> (0 windows, 0 elements)\n"
            );
        }
    }

    mod line_tests {
        use super::*;

        #[test]
        fn test_format_bounds() {
            assert_eq!(format_bounds(&Rect::new(1, 2, 3, 4)), "(1,2 3x4)");
        }

        #[test]
        fn test_colored_line_keeps_content() {
            console::set_colors_enabled(true);
            let tree = parse_tree(IOS_LOGIN).unwrap();
            let button = tree.find(|e| e.element_type == "button")[0];
            let line = element_line(button, true);
            assert!(line.contains("Sign in"));
            assert!(line.contains("\u{1b}["));
        }
    }
}
