/// Extension-based file categorization.
///
/// This module owns the category table: an ordered list of categories, each with
/// a set of lowercase extensions (leading dot included), plus exactly one
/// fallback category with no extensions. Classification only ever looks at the
/// file name, never at file content.
///
/// # Examples
///
/// ```
/// use filesort::file_category::CategoryTable;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.classify("holiday.JPG"), "Images");
/// assert_eq!(table.classify("notes.txt"), "Documents");
/// assert_eq!(table.classify("mystery.xyz"), "Other");
/// ```
use thiserror::Error;

/// Built-in categories in lookup order. The entry with no extensions is the fallback.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Images",
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico"],
    ),
    (
        "Documents",
        &[
            ".docx", ".doc", ".txt", ".xlsx", ".xls", ".pptx", ".ppt", ".odt", ".rtf",
        ],
    ),
    ("PDFs", &[".pdf"]),
    (
        "Videos",
        &[".mp4", ".mov", ".avi", ".mkv", ".wmv", ".webm", ".m4v"],
    ),
    (
        "Audio",
        &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a", ".wma"],
    ),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"]),
    ("Other", &[]),
];

/// Errors raised when a category table is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryTableError {
    #[error("category table is empty")]
    Empty,

    #[error("category name '{name}' is not a valid folder name")]
    InvalidName { name: String },

    #[error("category '{name}' is defined more than once")]
    DuplicateName { name: String },

    #[error("category table needs exactly one fallback category (no extensions), found {count}")]
    FallbackCount { count: usize },
}

/// A named bucket owning a set of file extensions and a destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    extensions: Vec<String>,
}

impl Category {
    /// Creates a category. Extensions are lowercased and given a leading dot
    /// if they lack one; duplicates are dropped.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, extensions: &[S]) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref());
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Self {
            name: name.into(),
            extensions: normalized,
        }
    }

    /// The category name, which is also the destination folder name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase extensions owned by this category, leading dot included.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// True for the catch-all category.
    pub fn is_fallback(&self) -> bool {
        self.extensions.is_empty()
    }

    fn owns(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// Ordered category table used by the classifier and the organizer.
///
/// Lookup walks the table in definition order and the first category owning the
/// extension wins, so table order is the tie-break when extension sets overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
    fallback: usize,
}

impl CategoryTable {
    /// Builds a validated table.
    ///
    /// # Errors
    ///
    /// Fails when the table is empty, a name is not a plain folder name, a name
    /// repeats, or the number of fallback categories is not exactly one.
    pub fn new(categories: Vec<Category>) -> Result<Self, CategoryTableError> {
        if categories.is_empty() {
            return Err(CategoryTableError::Empty);
        }

        for (i, category) in categories.iter().enumerate() {
            if !is_valid_folder_name(category.name()) {
                return Err(CategoryTableError::InvalidName {
                    name: category.name().to_string(),
                });
            }
            if categories[..i].iter().any(|c| c.name() == category.name()) {
                return Err(CategoryTableError::DuplicateName {
                    name: category.name().to_string(),
                });
            }
        }

        let fallbacks: Vec<usize> = categories
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_fallback())
            .map(|(i, _)| i)
            .collect();
        if fallbacks.len() != 1 {
            return Err(CategoryTableError::FallbackCount {
                count: fallbacks.len(),
            });
        }

        Ok(Self {
            fallback: fallbacks[0],
            categories,
        })
    }

    /// The built-in table: Images, Documents, PDFs, Videos, Audio, Archives, Other.
    pub fn builtin() -> Self {
        let categories = BUILTIN_CATEGORIES
            .iter()
            .map(|(name, exts)| Category::new(*name, *exts))
            .collect();
        Self {
            categories,
            fallback: BUILTIN_CATEGORIES.len() - 1,
        }
    }

    /// Categories in table order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(Category::name)
    }

    /// Name of the fallback category.
    pub fn fallback(&self) -> &str {
        self.categories[self.fallback].name()
    }

    /// Maps a file name to its category name. See [`classify`].
    pub fn classify(&self, file_name: &str) -> &str {
        let extension = extension_of(file_name);
        self.categories
            .iter()
            .filter(|c| !c.is_fallback())
            .find(|c| c.owns(&extension))
            .map(Category::name)
            .unwrap_or_else(|| self.fallback())
    }

    /// Extensions claimed by more than one category, with the claimants in
    /// table order. The first claimant is the one `classify` returns.
    pub fn overlaps(&self) -> Vec<(String, Vec<String>)> {
        let mut overlaps: Vec<(String, Vec<String>)> = Vec::new();
        for (i, category) in self.categories.iter().enumerate() {
            for ext in category.extensions() {
                if overlaps.iter().any(|(e, _)| e == ext) {
                    continue;
                }
                let later: Vec<String> = self.categories[i + 1..]
                    .iter()
                    .filter(|c| c.owns(ext))
                    .map(|c| c.name().to_string())
                    .collect();
                if !later.is_empty() {
                    let mut owners = vec![category.name().to_string()];
                    owners.extend(later);
                    overlaps.push((ext.clone(), owners));
                }
            }
        }
        overlaps
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Returns the category for `file_name` according to `table`.
///
/// The extension is taken from the last `.` of the name and lowercased; the
/// fallback category is skipped during lookup and returned when nothing matches.
/// Never fails and has no side effects.
pub fn classify<'a>(file_name: &str, table: &'a CategoryTable) -> &'a str {
    table.classify(file_name)
}

/// Splits a file name into stem and extension, keeping case.
///
/// The extension starts at the last `.`; dots at the very start of the name do
/// not count, so `.bashrc` has no extension while `archive.tar.gz` has `.gz`.
///
/// ```
/// use filesort::file_category::split_name;
///
/// assert_eq!(split_name("report.final.PDF"), ("report.final", ".PDF"));
/// assert_eq!(split_name(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_name("README"), ("README", ""));
/// ```
pub fn split_name(file_name: &str) -> (&str, &str) {
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[leading_dots..].rfind('.') {
        Some(pos) => file_name.split_at(leading_dots + pos),
        None => (file_name, ""),
    }
}

/// Lowercased extension of a file name, leading dot included, or `""`.
pub fn extension_of(file_name: &str) -> String {
    split_name(file_name).1.to_lowercase()
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn is_valid_folder_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_table() -> CategoryTable {
        CategoryTable::new(vec![
            Category::new("Code", &["rs", ".TOML"]),
            Category::new("Misc", &[] as &[&str]),
            Category::new("Config", &[".toml", ".ini"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_builtin_order_and_fallback() {
        let table = CategoryTable::default();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            vec![
                "Images",
                "Documents",
                "PDFs",
                "Videos",
                "Audio",
                "Archives",
                "Other"
            ]
        );
        assert_eq!(table.fallback(), "Other");
    }

    #[test]
    fn test_classify_known_extensions() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("a.jpg"), "Images");
        assert_eq!(table.classify("b.pdf"), "PDFs");
        assert_eq!(table.classify("c.docx"), "Documents");
        assert_eq!(table.classify("d.mkv"), "Videos");
        assert_eq!(table.classify("e.flac"), "Audio");
        assert_eq!(table.classify("f.tar.gz"), "Archives");
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("Photo.JPG"), table.classify("photo.jpg"));
        assert_eq!(table.classify("Song.Mp3"), "Audio");
    }

    #[test]
    fn test_classify_unknown_or_missing_extension() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("c.xyz"), "Other");
        assert_eq!(table.classify("Makefile"), "Other");
        assert_eq!(table.classify(".bashrc"), "Other");
        assert_eq!(table.classify("trailing."), "Other");
    }

    #[test]
    fn test_free_function_matches_method() {
        let table = CategoryTable::default();
        assert_eq!(classify("clip.webm", &table), "Videos");
    }

    #[test]
    fn test_custom_table_normalizes_extensions() {
        let table = custom_table();
        assert_eq!(table.classify("main.RS"), "Code");
        assert_eq!(table.fallback(), "Misc");
        assert_eq!(table.classify("photo.jpg"), "Misc");
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let table = custom_table();
        assert_eq!(table.classify("Cargo.toml"), "Code");
        assert_eq!(
            table.overlaps(),
            vec![(
                ".toml".to_string(),
                vec!["Code".to_string(), "Config".to_string()]
            )]
        );
    }

    #[test]
    fn test_builtin_has_no_overlaps() {
        assert!(CategoryTable::builtin().overlaps().is_empty());
    }

    #[test]
    fn test_table_requires_exactly_one_fallback() {
        let none = CategoryTable::new(vec![Category::new("Images", &["png"])]);
        assert_eq!(none, Err(CategoryTableError::FallbackCount { count: 0 }));

        let two = CategoryTable::new(vec![
            Category::new("A", &[] as &[&str]),
            Category::new("B", &[] as &[&str]),
        ]);
        assert_eq!(two, Err(CategoryTableError::FallbackCount { count: 2 }));
    }

    #[test]
    fn test_table_rejects_bad_names() {
        assert_eq!(CategoryTable::new(vec![]), Err(CategoryTableError::Empty));
        assert!(matches!(
            CategoryTable::new(vec![Category::new("../up", &[] as &[&str])]),
            Err(CategoryTableError::InvalidName { .. })
        ));
        assert!(matches!(
            CategoryTable::new(vec![
                Category::new("Same", &["a"]),
                Category::new("Same", &[] as &[&str]),
            ]),
            Err(CategoryTableError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("report.txt"), ("report", ".txt"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("..hidden"), ("..hidden", ""));
        assert_eq!(split_name("file."), ("file", "."));
        assert_eq!(split_name(""), ("", ""));
    }
}
