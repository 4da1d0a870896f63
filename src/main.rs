//! # Folia CLI
//!
//! Usage:
//!   folia state.json -o report.json
//!   echo '{ ... }' | folia -o report.json
//!   folia --example > state.json
//!
//! Reads persisted notebook state (current or legacy shape), normalizes it,
//! and writes the layout report: writing area, line count, and per-block
//! float hints.

use std::env;
use std::fs;
use std::io::{self, Read};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Handle --example flag
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_state_json());
        return;
    }

    // Read input
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        match fs::read_to_string(&args[1]) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("✗ Failed to read input file '{}': {}", args[1], e);
                std::process::exit(1);
            }
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("✗ Failed to read stdin: {}", e);
            std::process::exit(1);
        }
        buf
    };

    // Parse output path
    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone());

    match folia::layout_report_json(&input) {
        Ok(report) => match output_path {
            Some(path) => {
                if let Err(e) = fs::write(&path, &report) {
                    eprintln!("✗ Failed to write report: {}", e);
                    std::process::exit(1);
                }
                eprintln!("✓ Written {} bytes to {}", report.len(), path);
            }
            None => println!("{report}"),
        },
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn example_state_json() -> &'static str {
    // The second image is a legacy record (absolute x/y) and gets migrated
    // to the side/top model on load.
    r##"{
  "text": "Lined paper, honest margins.\n",
  "fontSize": 14,
  "fontFamily": "serif",
  "spacingKey": "8mm",
  "showLines": true,
  "showHoles": true,
  "isBackSide": false,
  "images": [
    {
      "id": "image-1",
      "side": "right",
      "top": 24,
      "width": 60,
      "height": 45,
      "url": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg=="
    },
    {
      "id": "image-2",
      "x": 120,
      "y": 90,
      "width": 50,
      "height": 50,
      "url": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg=="
    }
  ],
  "forbiddenAreas": [
    {
      "id": "forbidden-1",
      "side": "left",
      "top": 20,
      "width": 35,
      "height": 30
    }
  ]
}
"##
}
