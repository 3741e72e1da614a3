//! Language templates applied at workspace creation

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Token in seed files replaced with the workspace name
pub const PLACEHOLDER: &str = "PROJECT";

/// Default commands and seed files for a language tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageTemplate {
    pub lang: &'static str,
    pub build_cmd: &'static str,
    pub clean_cmd: &'static str,
    pub run_cmd: &'static str,
    pub test_cmd: &'static str,
    /// `(relative path, content)` pairs
    pub files: &'static [(&'static str, &'static str)],
}

const TEMPLATES: &[LanguageTemplate] = &[
    LanguageTemplate {
        lang: "c",
        build_cmd: "make",
        clean_cmd: "make clean",
        run_cmd: "./build/main",
        test_cmd: "",
        files: &[(
            "Makefile",
            "CC=gcc\nCFLAGS=-Wall -Wextra -O2\n\nall:\n\t$(CC) $(CFLAGS) src/*.c -o build/main\n\nclean:\n\trm -rf build/*\n",
        )],
    },
    LanguageTemplate {
        lang: "cpp",
        build_cmd: "make",
        clean_cmd: "make clean",
        run_cmd: "./build/main",
        test_cmd: "",
        files: &[(
            "Makefile",
            "CXX=g++\nCXXFLAGS=-Wall -Wextra -std=c++17 -O2\n\nall:\n\t$(CXX) $(CXXFLAGS) src/*.cpp -o build/main\n\nclean:\n\trm -rf build/*\n",
        )],
    },
    LanguageTemplate {
        lang: "rust",
        build_cmd: "cargo build --release",
        clean_cmd: "cargo clean",
        run_cmd: "cargo run",
        test_cmd: "cargo test",
        files: &[
            (
                "Cargo.toml",
                "[package]\nname = \"PROJECT\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
            ),
            (
                "src/main.rs",
                "fn main() {\n    println!(\"Hello from PROJECT!\");\n}\n",
            ),
        ],
    },
    LanguageTemplate {
        lang: "python",
        build_cmd: "pip install -e .",
        clean_cmd: "rm -rf build/ dist/ *.egg-info",
        run_cmd: "python src/main.py",
        test_cmd: "pytest tests/",
        files: &[
            ("requirements.txt", ""),
            (
                "src/main.py",
                "#!/usr/bin/env python3\n\nif __name__ == '__main__':\n    print('Hello from PROJECT!')\n",
            ),
        ],
    },
    LanguageTemplate {
        lang: "go",
        build_cmd: "go build -o build/main ./src",
        clean_cmd: "rm -rf build/",
        run_cmd: "./build/main",
        test_cmd: "go test ./...",
        files: &[
            ("go.mod", "module PROJECT\n\ngo 1.21\n"),
            (
                "src/main.go",
                "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello from PROJECT!\")\n}\n",
            ),
        ],
    },
    LanguageTemplate {
        lang: "node",
        build_cmd: "npm run build",
        clean_cmd: "rm -rf dist/ node_modules/",
        run_cmd: "npm start",
        test_cmd: "npm test",
        files: &[
            (
                "package.json",
                "{\n  \"name\": \"PROJECT\",\n  \"version\": \"1.0.0\",\n  \"scripts\": {\n    \"start\": \"node src/index.js\",\n    \"build\": \"echo 'Build complete'\"\n  }\n}\n",
            ),
            ("src/index.js", "console.log('Hello from PROJECT!');\n"),
        ],
    },
];

/// Template for `lang`, if one exists
pub fn find_template(lang: &str) -> Option<&'static LanguageTemplate> {
    TEMPLATES.iter().find(|t| t.lang == lang)
}

/// Every known language tag
pub fn known_languages() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|t| t.lang)
}

impl LanguageTemplate {
    /// Write every seed file under `root` with the placeholder replaced
    pub fn write_files(&self, root: &Path, name: &str) -> Result<()> {
        for (rel, content) in self.files {
            let target = root.join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, render(content, name))?;
        }
        Ok(())
    }
}

/// Replace every placeholder occurrence with `name`
pub fn render(content: &str, name: &str) -> String {
    content.replace(PLACEHOLDER, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_template() {
        assert_eq!(find_template("go").unwrap().run_cmd, "./build/main");
        assert!(find_template("cobol").is_none());
        assert_eq!(known_languages().count(), 6);
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        assert_eq!(render("PROJECT-PROJECT", "demo"), "demo-demo");
        assert_eq!(render("no token", "demo"), "no token");
    }

    #[test]
    fn test_write_files() {
        let dir = TempDir::new().unwrap();
        find_template("go")
            .unwrap()
            .write_files(dir.path(), "demo")
            .unwrap();

        let go_mod = std::fs::read_to_string(dir.path().join("go.mod")).unwrap();
        assert_eq!(go_mod, "module demo\n\ngo 1.21\n");
        let main = std::fs::read_to_string(dir.path().join("src/main.go")).unwrap();
        assert!(main.contains("Hello from demo!"));
        assert!(!main.contains(PLACEHOLDER));
    }
}
