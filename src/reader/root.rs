//! ROOT file access through `oxyroot`.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use oxyroot::{Branch, Named, ReaderTree, Slice, UnmarshalerInto};

use super::{Cell, CellIter, DataFile, EventTree, ReaderError};

// TNtuple and TNtupleD derive from TTree.
const TREE_CLASSES: &[&str] = &["TTree", "TNtuple", "TNtupleD"];
const ROOT_MAGIC: &[u8; 4] = b"root";

macro_rules! decode_with {
    ($decoder:ident, $elem:expr, $branch:expr) => {
        match $elem {
            Elem::F32 => $decoder::<f32>($branch),
            Elem::F64 => $decoder::<f64>($branch),
            Elem::I8 => $decoder::<i8>($branch),
            Elem::U8 => $decoder::<u8>($branch),
            Elem::I16 => $decoder::<i16>($branch),
            Elem::U16 => $decoder::<u16>($branch),
            Elem::I32 => $decoder::<i32>($branch),
            Elem::U32 => $decoder::<u32>($branch),
            Elem::I64 => $decoder::<i64>($branch),
            Elem::U64 => $decoder::<u64>($branch),
            Elem::Bool => $decoder::<bool>($branch),
        }
    };
}

/// A ROOT file opened for reading.
pub struct RootFile {
    inner: oxyroot::RootFile,
    path: PathBuf,
}

impl RootFile {
    /// Open a ROOT file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        // oxyroot asserts on the magic, check it first
        let mut magic = [0u8; 4];
        let mut handle = File::open(path)?;
        if handle.read_exact(&mut magic).is_err() || &magic != ROOT_MAGIC {
            return Err(ReaderError::Open(format!(
                "{}: not a ROOT file",
                path.display()
            )));
        }
        drop(handle);

        let inner = oxyroot::RootFile::open(path)
            .map_err(|err| map_root_error(&path.display().to_string(), err))?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for RootFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootFile").field("path", &self.path).finish()
    }
}

impl DataFile for RootFile {
    type Tree = RootTree;

    fn tree_names(&self) -> Vec<String> {
        // Keys repeat once per cycle; keep the first occurrence.
        let mut names: Vec<String> = Vec::new();
        for key in self.inner.keys() {
            if is_tree_class(key.class_name()) && !names.iter().any(|n| n == key.name()) {
                names.push(key.name().to_string());
            }
        }
        names
    }

    fn open_tree(&mut self, name: &str) -> Result<RootTree, ReaderError> {
        // get_tree panics on objects that are not trees
        if !self.has_tree(name) {
            return Err(ReaderError::TreeNotFound(name.to_string()));
        }
        let tree = self
            .inner
            .get_tree(name)
            .map_err(|err| map_root_error(&format!("tree '{name}'"), err))?;
        debug!("Opened tree '{}' with {} entries", name, tree.entries());
        Ok(RootTree {
            name: name.to_string(),
            tree,
        })
    }
}

/// A TTree read through `oxyroot`.
pub struct RootTree {
    name: String,
    tree: ReaderTree,
}

impl fmt::Debug for RootTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootTree")
            .field("name", &self.name)
            .field("entries", &self.tree.entries())
            .finish()
    }
}

impl EventTree for RootTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_entries(&self) -> u64 {
        self.tree.entries().max(0) as u64
    }

    fn branch_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for branch in self.tree.branches_r() {
            if !names.iter().any(|n| n == branch.name()) {
                names.push(branch.name().to_string());
            }
        }
        names
    }

    fn cells(&self, branch: &str) -> Result<CellIter<'_>, ReaderError> {
        let found = self
            .tree
            .branch(branch)
            .ok_or_else(|| ReaderError::BranchNotFound(branch.to_string()))?;
        let type_name = found.item_type_name();
        let (layout, elem) =
            parse_type(&type_name).ok_or_else(|| ReaderError::UnsupportedType {
                branch: branch.to_string(),
                type_name: type_name.clone(),
            })?;
        debug!("Decoding branch '{}' as {:?} {:?}", branch, layout, elem);
        Ok(match layout {
            Layout::Scalar => decode_with!(scalar_cells, elem, found),
            Layout::Array => decode_with!(array_cells, elem, found),
            Layout::Vector => decode_with!(vector_cells, elem, found),
        })
    }
}

fn is_tree_class(class_name: &str) -> bool {
    TREE_CLASSES.contains(&class_name)
}

fn map_root_error<E: fmt::Display>(context: &str, err: E) -> ReaderError {
    // oxyroot's error type is not public
    ReaderError::Open(format!("{context}: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Scalar,
    Array,
    Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Elem {
    F32,
    F64,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Bool,
}

impl Elem {
    fn parse(name: &str) -> Option<Elem> {
        Some(match name {
            "float" | "Float_t" => Elem::F32,
            "double" | "Double_t" | "Double32_t" => Elem::F64,
            "int8_t" | "char" | "Char_t" => Elem::I8,
            "uint8_t" | "unsignedchar" | "UChar_t" => Elem::U8,
            "int16_t" | "short" | "Short_t" => Elem::I16,
            "uint16_t" | "unsignedshort" | "UShort_t" => Elem::U16,
            "int32_t" | "int" | "Int_t" => Elem::I32,
            "uint32_t" | "unsignedint" | "UInt_t" => Elem::U32,
            "int64_t" | "long" | "longlong" | "Long64_t" => Elem::I64,
            "uint64_t" | "unsignedlong" | "unsignedlonglong" | "ULong64_t" => Elem::U64,
            "bool" | "Bool_t" => Elem::Bool,
            _ => return None,
        })
    }
}

/// Map a ROOT item type name onto a decoder. Fixed-size arrays are not
/// supported.
fn parse_type(type_name: &str) -> Option<(Layout, Elem)> {
    let compact: String = type_name.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.strip_prefix("std::").unwrap_or(&compact);
    if let Some(inner) = compact
        .strip_prefix("vector<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return Elem::parse(inner).map(|elem| (Layout::Vector, elem));
    }
    if let Some(inner) = compact.strip_suffix("[]") {
        return Elem::parse(inner).map(|elem| (Layout::Array, elem));
    }
    Elem::parse(compact).map(|elem| (Layout::Scalar, elem))
}

trait AsF64 {
    fn as_f64(self) -> f64;
}

macro_rules! impl_as_f64 {
    ($($ty:ty),*) => {
        $(impl AsF64 for $ty {
            fn as_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_as_f64!(f32, f64, i8, u8, i16, u16, i32, u32, i64, u64);

impl AsF64 for bool {
    fn as_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

// The typed iterators check names strictly; dispatch already matched the
// item type, so the unchecked variants are used.

fn scalar_cells<'a, T>(branch: &'a Branch) -> CellIter<'a>
where
    T: UnmarshalerInto<Item = T> + AsF64 + 'a,
{
    Box::new(
        branch
            .as_iter_unchecked::<T>()
            .map(|v| Cell::Value(v.as_f64())),
    )
}

fn array_cells<'a, T>(branch: &'a Branch) -> CellIter<'a>
where
    T: AsF64 + 'a,
    Slice<T>: UnmarshalerInto<Item = Slice<T>> + 'a,
{
    Box::new(branch.as_iter_unchecked::<Slice<T>>().map(|slice| {
        Cell::List(slice.into_vec().into_iter().map(AsF64::as_f64).collect())
    }))
}

fn vector_cells<'a, T>(branch: &'a Branch) -> CellIter<'a>
where
    T: AsF64 + 'a,
    Vec<T>: UnmarshalerInto<Item = Vec<T>> + 'a,
{
    Box::new(
        branch
            .as_iter_unchecked::<Vec<T>>()
            .map(|values| Cell::List(values.into_iter().map(AsF64::as_f64).collect())),
    )
}
