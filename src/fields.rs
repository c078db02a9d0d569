//! Enumerations and field types for todo management.
//!
//! This module defines the closed value sets attached to todos (priority and
//! category) and the view parameters used to filter and sort the todo list.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How important a todo is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All priorities in display order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Short label for tables.
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// The next priority in display order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }
}

/// Closed set of labels a todo can be filed under.
///
/// Stored with the labels the data has always used; English spellings are
/// accepted when reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "업무", alias = "work")]
    Work,
    #[serde(rename = "개인", alias = "personal")]
    Personal,
    #[serde(rename = "쇼핑", alias = "shopping")]
    Shopping,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [Category::Work, Category::Personal, Category::Shopping];

    /// Label as persisted and shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Category::Work => "업무",
            Category::Personal => "개인",
            Category::Shopping => "쇼핑",
        }
    }

    /// Step through `None -> Work -> Personal -> Shopping -> None`.
    pub fn cycle(current: Option<Category>) -> Option<Category> {
        match current {
            None => Some(Category::Work),
            Some(Category::Work) => Some(Category::Personal),
            Some(Category::Personal) => Some(Category::Shopping),
            Some(Category::Shopping) => None,
        }
    }
}

/// Completion status filter for the todo list.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Completed => "Completed",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }
}

/// Category filter: everything, or exactly one label.
///
/// Uncategorised todos never match a specific label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(category) => category.label(),
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::Work),
            CategoryFilter::Only(category) => match Category::cycle(Some(category)) {
                Some(next) => CategoryFilter::Only(next),
                None => CategoryFilter::All,
            },
        }
    }
}

impl From<Option<Category>> for CategoryFilter {
    fn from(category: Option<Category>) -> Self {
        category.map_or(CategoryFilter::All, CategoryFilter::Only)
    }
}

/// Available sorting options for the todo list.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    /// Most recently created first.
    #[default]
    Created,
    /// Alphabetical by text.
    Text,
    /// Earliest due date first; todos without one go last.
    Due,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Created => "Newest",
            SortKey::Text => "Text",
            SortKey::Due => "Due date",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            SortKey::Created => SortKey::Text,
            SortKey::Text => SortKey::Due,
            SortKey::Due => SortKey::Created,
        }
    }
}
