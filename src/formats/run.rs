//! Answers fed to WEPP on standard input for a single hillslope run.

use crate::formats::join_lines;

/// Run script for hillslope `id` (the part after the `p`/`H` prefix),
/// simulating `years` years. Outputs are written to `../output`.
pub fn script(id: &str, years: u32) -> String {
    let output = |kind: &str| format!("../output/H{}.{}.dat", id, kind);
    let input = |ext: &str| format!("p{}.{}", id, ext);

    let lines = vec![
        "m".to_string(),
        "Yes".to_string(),
        "1".to_string(),
        "1".to_string(),
        "No".to_string(),
        "2".to_string(),
        "No".to_string(),
        output("loss"),
        "No".to_string(),
        "Yes".to_string(),
        output("plant"),
        "Yes".to_string(),
        output("soil"),
        "No".to_string(),
        "No".to_string(),
        "Yes".to_string(),
        output("ebe"),
        "Yes".to_string(),
        output("element"),
        "No".to_string(),
        "No".to_string(),
        "Yes".to_string(),
        output("yield"),
        input("man"),
        input("slp"),
        input("cli"),
        input("sol"),
        "0".to_string(),
        years.to_string(),
        "0".to_string(),
    ];

    join_lines(&lines)
}
