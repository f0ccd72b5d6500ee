//! Static subject, major and help-mode data for the subject picker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    School,
    College,
    University,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::School => "School",
            Level::College => "College",
            Level::University => "University",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown education level: {0}")]
pub struct UnknownLevel(String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "School" => Ok(Level::School),
            "College" => Ok(Level::College),
            "University" => Ok(Level::University),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

/// `(subject name, short label)` in display order.
pub type SubjectList = &'static [(&'static str, &'static str)];

pub const SCHOOL_SUBJECTS: SubjectList = &[
    ("Mathematics", "🔢"),
    ("English Language", "📝"),
    ("English Literature", "📚"),
    ("Combined Science", "🔬"),
    ("Biology", "🧬"),
    ("Chemistry", "⚗️"),
    ("Physics", "⚛️"),
    ("Computer Science", "💻"),
    ("Geography", "🌍"),
    ("History", "📜"),
    ("Religious Studies", "🕌"),
    ("Business Studies", "💼"),
];

pub const COLLEGE_SUBJECTS: SubjectList = &[
    ("Mathematics (A-Level)", "📐"),
    ("Further Mathematics", "∞"),
    ("Computer Science (A-Level)", "💾"),
    ("Physics (A-Level)", "🔭"),
    ("Chemistry (A-Level)", "🧪"),
    ("Biology (A-Level)", "🦠"),
    ("Economics (A-Level)", "📊"),
    ("Business (A-Level)", "📈"),
    ("Psychology (A-Level)", "🧠"),
    ("Sociology (A-Level)", "👥"),
];

pub const UNIVERSITY_SUBJECTS_COMMON: SubjectList = &[
    ("Programming Fundamentals", "👨‍💻"),
    ("Object-Oriented Programming", "🎯"),
    ("Data Structures", "🗂️"),
    ("Algorithms", "🔄"),
    ("Discrete Mathematics", "🔢"),
    ("Databases (DBMS / SQL)", "🗄️"),
    ("Digital Logic Design", "⚡"),
    ("Computer Architecture", "🖥️"),
    ("Operating Systems", "🖱️"),
    ("Computer Networks", "🌐"),
    ("Software Engineering", "⚙️"),
    ("Web Development", "🌟"),
    ("Mobile App Development", "📱"),
    ("Cyber Security", "🔒"),
    ("Cryptography", "🔐"),
    ("AI / Machine Learning", "🤖"),
    ("Data Science", "📉"),
    ("Cloud Computing", "☁️"),
    ("DevOps (CI/CD)", "🚀"),
    ("HCI", "🖐️"),
    ("Final Year Project", "🎓"),
];

const FINANCE_SUBJECTS: SubjectList = &[
    ("Corporate Finance", "💰"),
    ("Financial Markets", "📊"),
    ("Portfolio Theory", "📈"),
    ("Valuation", "💵"),
];

const ECONOMICS_SUBJECTS: SubjectList = &[
    ("Microeconomics", "📊"),
    ("Macroeconomics", "🌍"),
    ("Econometrics", "📈"),
    ("Game Theory", "🎮"),
];

const ENGINEERING_SUBJECTS: SubjectList = &[
    ("Engineering Math", "📐"),
    ("Signals & Systems", "📡"),
    ("Control Systems", "🎛️"),
    ("Programming", "💻"),
];

const BUSINESS_SUBJECTS: SubjectList = &[
    ("Strategy", "🎯"),
    ("Operations", "⚙️"),
    ("Marketing", "📢"),
    ("Analytics", "📊"),
    ("Accounting", "💰"),
];

const ACCOUNTING_SUBJECTS: SubjectList = &[
    ("Financial Accounting", "💵"),
    ("Management Accounting", "📊"),
    ("Auditing", "🔍"),
];

pub const UNIVERSITY_MAJORS: &[&str] = &[
    "Computer Science",
    "Software Engineering",
    "Data Science",
    "Cyber Security",
    "Information Systems",
    "Business Management",
    "Economics",
    "Finance",
    "Accounting",
    "Engineering",
    "Other",
];

pub const HELP_MODES: &[(&str, &str)] = &[
    ("Explain Concept", "💡"),
    ("Solve Step-by-Step", "🔢"),
    ("Check My Work", "✅"),
    ("Create Study Plan", "📅"),
    ("Quiz Me", "❓"),
];

fn university_subjects(major: &str) -> SubjectList {
    match major {
        "Finance" => FINANCE_SUBJECTS,
        "Economics" => ECONOMICS_SUBJECTS,
        "Engineering" => ENGINEERING_SUBJECTS,
        "Business Management" => BUSINESS_SUBJECTS,
        "Accounting" => ACCOUNTING_SUBJECTS,
        // CS-flavoured majors, "Other" and anything unknown
        _ => UNIVERSITY_SUBJECTS_COMMON,
    }
}

pub fn subjects_for(level: Level, major: Option<&str>) -> SubjectList {
    match level {
        Level::School => SCHOOL_SUBJECTS,
        Level::College => COLLEGE_SUBJECTS,
        Level::University => {
            let major = major.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("Other");
            university_subjects(major)
        }
    }
}

/// Picker entries in `"<label> <name>"` form.
pub fn format_subject_choices(subjects: SubjectList) -> Vec<String> {
    subjects.iter().map(|(name, label)| format!("{label} {name}")).collect()
}

const ALL_SUBJECT_LISTS: &[SubjectList] = &[
    SCHOOL_SUBJECTS,
    COLLEGE_SUBJECTS,
    UNIVERSITY_SUBJECTS_COMMON,
    FINANCE_SUBJECTS,
    ECONOMICS_SUBJECTS,
    ENGINEERING_SUBJECTS,
    BUSINESS_SUBJECTS,
    ACCOUNTING_SUBJECTS,
];

fn is_subject_label(token: &str) -> bool {
    ALL_SUBJECT_LISTS
        .iter()
        .flat_map(|list| list.iter())
        .any(|(_, label)| *label == token)
}

/// Strips the leading label from a picker entry; plain names, multi-word ones
/// included, pass through untouched.
pub fn extract_subject_name(choice: &str) -> &str {
    match choice.split_once(' ') {
        Some((label, name)) if is_subject_label(label) => name,
        _ => choice,
    }
}
