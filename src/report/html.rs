use {
    crate::report::frame::escape,
    anyhow::{Context, Result},
    std::{fmt::Write as _, fs, path::Path},
};

pub fn get_css() -> String {
    "<style type=\"text/css\">
            h1 {
                font-size: 14pt;
                margin-left: 15px;
                margin-right: 15px;
                text-align: center;
                font-family: Helvetica, Verdana, Geneva, Arial, sans-serif;
            }
            h2 {
                font-size: 12pt;
                margin-left: 15px;
                margin-right: 15px;
                text-align: center;
                font-family: Helvetica, Verdana, Geneva, Arial, sans-serif;
            }
            p {
                font-size: 12pt;
                font-family: Helvetica, Verdana, Geneva, Arial, sans-serif;
                margin-left: 15px;
                margin-right: 15px;
            }
            table {
                font-size: 11pt;
                font-family: Helvetica, Verdana, Geneva, Arial, sans-serif;
                border-collapse: collapse;
                margin-left: auto;
                margin-right: auto;
            }
            td, th {
                border: 1px solid #222222;
                padding: 6px;
            }
            tr:nth-child(even) {
                background-color: #dddddd;
            }
            .numberCell {
                text-align: right;
            }
            .graph {
                text-align: center;
            }
        </style>"
        .to_string()
}

/// HTML table; numeric cells are right-aligned.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut s = String::from("<table>\n<tr>");
    for header in headers {
        let _ = write!(s, "<th>{}</th>", escape(header));
    }
    s.push_str("</tr>\n");
    for row in rows {
        s.push_str("<tr>");
        for cell in row {
            if cell.parse::<f64>().is_ok() {
                let _ = write!(s, "<td class=\"numberCell\">{}</td>", cell);
            } else {
                let _ = write!(s, "<td>{}</td>", escape(cell));
            }
        }
        s.push_str("</tr>\n");
    }
    s.push_str("</table>\n");
    s
}

/// A titled part of a report page holding preformatted HTML, e.g. an SVG graph
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

impl Section {
    pub fn new<S: Into<String>>(heading: S, body: String) -> Self {
        Section {
            heading: heading.into(),
            body,
        }
    }
}

pub fn page(title: &str, sections: &[Section]) -> String {
    let mut s = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n{}\n</head>\n<body>\n<h1>{}</h1>\n",
        escape(title),
        get_css(),
        escape(title)
    );
    for section in sections {
        let _ = write!(
            s,
            "<h2>{}</h2>\n<div class=\"graph\">\n{}</div>\n",
            escape(&section.heading),
            section.body
        );
    }
    s.push_str("</body>\n</html>\n");
    s
}

pub fn write_page<P: AsRef<Path>>(path: P, title: &str, sections: &[Section]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, page(title, sections)).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tables() {
        let html = table(&["Month", "NSE"], &[vec!["Apr".to_string(), "0.61".to_string()]]);
        assert!(html.contains("<th>Month</th><th>NSE</th>"));
        assert!(html.contains("<td>Apr</td><td class=\"numberCell\">0.61</td>"));
    }

    #[test]
    fn sections() {
        let html = page("GO1 & DO1", &[Section::new("Runoff", "<svg></svg>".to_string())]);
        assert!(html.contains("<h1>GO1 &amp; DO1</h1>"));
        assert!(html.contains("<h2>Runoff</h2>\n<div class=\"graph\">\n<svg></svg></div>"));
    }
}
