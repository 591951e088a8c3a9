use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// One entry of an installed package's contents listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentsEntry {
    /// `obj <path> <md5> <mtime>`
    File {
        /// Installed path.
        path: PathBuf,
        /// MD5 of the file at merge time.
        md5: String,
        /// Modification time at merge time (epoch seconds).
        mtime: i64,
    },
    /// `dir <path>`
    Dir {
        /// Installed path.
        path: PathBuf,
    },
    /// `sym <path> -> <target> <mtime>`
    Sym {
        /// Installed path of the link.
        path: PathBuf,
        /// Link target, as written.
        target: String,
        /// Modification time at merge time (epoch seconds).
        mtime: i64,
    },
    /// `fif <path>` or `dev <path>`.
    Other {
        /// Entry type tag (`fif`, `dev`).
        kind: String,
        /// Installed path.
        path: PathBuf,
    },
}

impl ContentsEntry {
    /// The installed path of this entry.
    pub fn path(&self) -> &PathBuf {
        match self {
            ContentsEntry::File { path, .. }
            | ContentsEntry::Dir { path }
            | ContentsEntry::Sym { path, .. }
            | ContentsEntry::Other { path, .. } => path,
        }
    }
}

/// The contents listing of an installed package, in merge order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contents {
    entries: Vec<ContentsEntry>,
}

impl Contents {
    /// An empty listing.
    pub fn new() -> Self {
        Contents::default()
    }

    /// Append an entry.
    pub fn add(&mut self, entry: ContentsEntry) {
        self.entries.push(entry);
    }

    /// Entries in merge order.
    pub fn entries(&self) -> &[ContentsEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a `CONTENTS` listing, one entry per line.
    ///
    /// Paths may contain spaces; the trailing md5/mtime columns are taken
    /// from the right.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::Contents;
    ///
    /// let contents = Contents::parse("\
    /// dir /usr/bin
    /// obj /usr/bin/pkg-one d41d8cd98f00b204e9800998ecf8427e 1234567890
    /// sym /usr/bin/one -> pkg-one 1234567890
    /// ").unwrap();
    /// assert_eq!(contents.len(), 3);
    /// ```
    pub fn parse(input: &str) -> Result<Contents> {
        let mut contents = Contents::new();
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            contents.add(parse_line(line)?);
        }
        Ok(contents)
    }
}

fn parse_line(line: &str) -> Result<ContentsEntry> {
    let invalid = || Error::InvalidContents(line.to_string());
    let (kind, rest) = line.split_once(' ').ok_or_else(invalid)?;

    match kind {
        "dir" => Ok(ContentsEntry::Dir {
            path: PathBuf::from(rest),
        }),
        "fif" | "dev" => Ok(ContentsEntry::Other {
            kind: kind.to_string(),
            path: PathBuf::from(rest),
        }),
        "obj" => {
            let (rest, mtime) = rest.rsplit_once(' ').ok_or_else(invalid)?;
            let (path, md5) = rest.rsplit_once(' ').ok_or_else(invalid)?;
            Ok(ContentsEntry::File {
                path: PathBuf::from(path),
                md5: md5.to_string(),
                mtime: mtime.parse().map_err(|_| invalid())?,
            })
        }
        "sym" => {
            let (rest, mtime) = rest.rsplit_once(' ').ok_or_else(invalid)?;
            let (path, target) = rest.split_once(" -> ").ok_or_else(invalid)?;
            Ok(ContentsEntry::Sym {
                path: PathBuf::from(path),
                target: target.to_string(),
                mtime: mtime.parse().map_err(|_| invalid())?,
            })
        }
        _ => Err(invalid()),
    }
}

impl fmt::Display for ContentsEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContentsEntry::File { path, md5, mtime } => {
                write!(f, "obj {} {md5} {mtime}", path.display())
            }
            ContentsEntry::Dir { path } => write!(f, "dir {}", path.display()),
            ContentsEntry::Sym {
                path,
                target,
                mtime,
            } => write!(f, "sym {} -> {target} {mtime}", path.display()),
            ContentsEntry::Other { kind, path } => write!(f, "{kind} {}", path.display()),
        }
    }
}
