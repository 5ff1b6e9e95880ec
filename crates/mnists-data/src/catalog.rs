// Catalog — static description of every known dataset
//
// A dataset is four IDX resources (train/test x images/labels), each with a
// filename and MD5, plus the mirrors that serve them and the class names
// the labels index into. Everything here is `'static` data; nothing is
// looked up at runtime.
//
// EMNIST is a composite: one archive (`gzip.zip`) that holds the files of
// five variants. Variant descriptors list no mirrors because their files
// come out of the archive, not off the network.

use std::path::PathBuf;

/// Which of the four files of a dataset a resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    TrainImages,
    TrainLabels,
    TestImages,
    TestLabels,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::TrainImages,
        ResourceKind::TrainLabels,
        ResourceKind::TestImages,
        ResourceKind::TestLabels,
    ];

    /// Stable logical name, used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::TrainImages => "train_images",
            ResourceKind::TrainLabels => "train_labels",
            ResourceKind::TestImages => "test_images",
            ResourceKind::TestLabels => "test_labels",
        }
    }

    pub fn is_images(&self) -> bool {
        matches!(self, ResourceKind::TrainImages | ResourceKind::TestImages)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// One remote or archived file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub filename: &'static str,
    /// Lowercase hex MD5 of the file as stored on disk.
    pub md5: &'static str,
}

/// A single downloadable (or extractable) dataset.
#[derive(Debug, PartialEq, Eq)]
pub struct DatasetDescriptor {
    /// Display name, also the directory name under the default root.
    pub name: &'static str,
    /// Extra names accepted by [`find`], lowercase.
    pub aliases: &'static [&'static str],
    /// Ordered as [`ResourceKind::ALL`].
    pub resources: [Resource; 4],
    /// Base URLs, tried in order. Empty for archive members.
    pub mirrors: &'static [&'static str],
    /// Human-readable class names; label `i` names `classes[i]`.
    pub classes: &'static [&'static str],
}

impl DatasetDescriptor {
    pub fn resource(&self, kind: ResourceKind) -> &Resource {
        &self.resources[kind.index()]
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// `<tmp>/mnists/<name>`.
    pub fn default_dir(&self) -> PathBuf {
        default_root().join(self.name)
    }

    fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query) || self.aliases.contains(&query)
    }
}

/// The archive a composite dataset is distributed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveResource {
    pub filename: &'static str,
    pub md5: &'static str,
}

/// A dataset family shipped as one archive holding several variants.
#[derive(Debug, PartialEq, Eq)]
pub struct CompositeDescriptor {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub archive: ArchiveResource,
    pub mirrors: &'static [&'static str],
    pub variants: &'static [&'static DatasetDescriptor],
}

impl CompositeDescriptor {
    /// `<tmp>/mnists/<name>`.
    pub fn default_dir(&self) -> PathBuf {
        default_root().join(self.name)
    }

    /// Look up a variant by name or alias, case-insensitively.
    pub fn variant(&self, name: &str) -> Option<&'static DatasetDescriptor> {
        let query = name.to_ascii_lowercase();
        self.variants.iter().copied().find(|v| v.matches(&query))
    }

    fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query) || self.aliases.contains(&query)
    }
}

/// Root directory all default dataset directories live under.
pub fn default_root() -> PathBuf {
    std::env::temp_dir().join("mnists")
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Dataset(&'static DatasetDescriptor),
    Composite(&'static CompositeDescriptor),
}

impl Entry {
    pub fn name(&self) -> &'static str {
        match self {
            Entry::Dataset(d) => d.name,
            Entry::Composite(c) => c.name,
        }
    }
}

/// Every standalone and variant dataset, in catalog order.
pub static DATASETS: &[&DatasetDescriptor] = &[
    &MNIST,
    &FASHION_MNIST,
    &KMNIST,
    &EMNIST_BALANCED,
    &EMNIST_BYCLASS,
    &EMNIST_BYMERGE,
    &EMNIST_DIGITS,
    &EMNIST_LETTERS,
];

/// Every composite dataset.
pub static COMPOSITES: &[&CompositeDescriptor] = &[&EMNIST];

/// Find a dataset or composite by name or alias, case-insensitively.
///
/// ```
/// use mnists_data::catalog::{find, Entry, FASHION_MNIST};
/// assert_eq!(find("fmnist"), Some(Entry::Dataset(&FASHION_MNIST)));
/// assert!(find("cifar10").is_none());
/// ```
pub fn find(name: &str) -> Option<Entry> {
    let query = name.trim().to_ascii_lowercase();
    if let Some(d) = DATASETS.iter().copied().find(|d| d.matches(&query)) {
        return Some(Entry::Dataset(d));
    }
    COMPOSITES
        .iter()
        .copied()
        .find(|c| c.matches(&query))
        .map(Entry::Composite)
}

/// The composite a variant descriptor belongs to, if any.
pub fn parent_of(descriptor: &DatasetDescriptor) -> Option<&'static CompositeDescriptor> {
    COMPOSITES
        .iter()
        .copied()
        .find(|c| c.variants.iter().any(|v| std::ptr::eq(*v, descriptor)))
}

const fn resources(files: [(&'static str, &'static str); 4]) -> [Resource; 4] {
    [
        Resource {
            kind: ResourceKind::TrainImages,
            filename: files[0].0,
            md5: files[0].1,
        },
        Resource {
            kind: ResourceKind::TrainLabels,
            filename: files[1].0,
            md5: files[1].1,
        },
        Resource {
            kind: ResourceKind::TestImages,
            filename: files[2].0,
            md5: files[2].1,
        },
        Resource {
            kind: ResourceKind::TestLabels,
            filename: files[3].0,
            md5: files[3].1,
        },
    ]
}

// MNIST family

pub static MNIST: DatasetDescriptor = DatasetDescriptor {
    name: "MNIST",
    aliases: &[],
    resources: resources([
        ("train-images-idx3-ubyte.gz", "f68b3c2dcbeaaa9fbdd348bbdeb94873"),
        ("train-labels-idx1-ubyte.gz", "d53e105ee54ea40749a09fcbcd1e9432"),
        ("t10k-images-idx3-ubyte.gz", "9fb629c4189551a2d022fa330f9573f3"),
        ("t10k-labels-idx1-ubyte.gz", "ec29112dd5afa0611ce80d1b7f02629c"),
    ]),
    mirrors: &[
        "https://storage.googleapis.com/cvdf-datasets/mnist/",
        "https://ossci-datasets.s3.amazonaws.com/mnist/",
        "http://yann.lecun.com/exdb/mnist/",
    ],
    classes: &[
        "0 - zero", "1 - one", "2 - two", "3 - three", "4 - four", "5 - five", "6 - six",
        "7 - seven", "8 - eight", "9 - nine",
    ],
};

pub static FASHION_MNIST: DatasetDescriptor = DatasetDescriptor {
    name: "FashionMNIST",
    aliases: &["fmnist", "fashion-mnist", "fashion_mnist"],
    resources: resources([
        ("train-images-idx3-ubyte.gz", "8d4fb7e6c68d591d4c3dfef9ec88bf0d"),
        ("train-labels-idx1-ubyte.gz", "25c81989df183df01b3e8a0aad5dffbe"),
        ("t10k-images-idx3-ubyte.gz", "bef4ecab320f06d8554ea6380940ec79"),
        ("t10k-labels-idx1-ubyte.gz", "bb300cfdad3c16e7a12a480ee83cd310"),
    ]),
    mirrors: &["http://fashion-mnist.s3-website.eu-central-1.amazonaws.com/"],
    classes: &[
        "T-shirt/top", "Trouser", "Pullover", "Dress", "Coat", "Sandal", "Shirt", "Sneaker",
        "Bag", "Ankle boot",
    ],
};

pub static KMNIST: DatasetDescriptor = DatasetDescriptor {
    name: "KMNIST",
    aliases: &["kuzushiji-mnist", "kuzushiji_mnist"],
    resources: resources([
        ("train-images-idx3-ubyte.gz", "bdb82020997e1d708af4cf47b453dcf7"),
        ("train-labels-idx1-ubyte.gz", "e144d726b3acfaa3e44228e80efcd344"),
        ("t10k-images-idx3-ubyte.gz", "5c965bf0a639b31b8f53240b1b52f4d7"),
        ("t10k-labels-idx1-ubyte.gz", "7320c461ea6c1c855c0b718fb2a4b134"),
    ]),
    mirrors: &["http://codh.rois.ac.jp/kmnist/dataset/kmnist/"],
    classes: &[
        "お - o", "き - ki", "す - su", "つ - tsu", "な - na", "は - ha", "ま - ma", "や - ya",
        "れ - re", "を - wo",
    ],
};

// EMNIST

pub static EMNIST: CompositeDescriptor = CompositeDescriptor {
    name: "EMNIST",
    aliases: &[],
    archive: ArchiveResource {
        filename: "gzip.zip",
        md5: "58c8d27c78d21e728a6bc7b3cc06412e",
    },
    mirrors: &["https://biometrics.nist.gov/cs_links/EMNIST/"],
    variants: &[
        &EMNIST_BALANCED,
        &EMNIST_BYCLASS,
        &EMNIST_BYMERGE,
        &EMNIST_DIGITS,
        &EMNIST_LETTERS,
    ],
};

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const BALANCED_CLASSES: [&str; 47] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C - c", "D", "E", "F", "G", "H",
    "I - i", "J - j", "K - k", "L - l", "M - m", "N", "O - o", "P - p", "Q", "R", "S - s", "T",
    "U - u", "V - v", "W - w", "X - x", "Y - y", "Z - z", "a", "b", "d", "e", "f", "g", "h", "n",
    "q", "r", "t",
];

const BYCLASS_CLASSES: [&str; 62] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C", "D", "E", "F", "G", "H", "I",
    "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "a", "b",
    "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u",
    "v", "w", "x", "y", "z",
];

const LETTERS: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z",
];

pub static EMNIST_BALANCED: DatasetDescriptor = DatasetDescriptor {
    name: "Balanced",
    aliases: &["emnist-balanced", "emnist_balanced"],
    resources: resources([
        ("emnist-balanced-train-images-idx3-ubyte.gz", "4041b0d6f15785d3fa35263901b5496b"),
        ("emnist-balanced-train-labels-idx1-ubyte.gz", "7a35cc7b2b7ee7671eddf028570fbd20"),
        ("emnist-balanced-test-images-idx3-ubyte.gz", "6818d20fe2ce1880476f747bbc80b22b"),
        ("emnist-balanced-test-labels-idx1-ubyte.gz", "acd3694070dcbf620e36670519d4b32f"),
    ]),
    mirrors: &[],
    classes: &BALANCED_CLASSES,
};

pub static EMNIST_BYCLASS: DatasetDescriptor = DatasetDescriptor {
    name: "ByClass",
    aliases: &["emnist-byclass", "emnist_byclass"],
    resources: resources([
        ("emnist-byclass-train-images-idx3-ubyte.gz", "712dda0bd6f00690f32236ae4325c377"),
        ("emnist-byclass-train-labels-idx1-ubyte.gz", "ee299a3ee5faf5c31e9406763eae7e43"),
        ("emnist-byclass-test-images-idx3-ubyte.gz", "1435209e34070a9002867a9ab50160d7"),
        ("emnist-byclass-test-labels-idx1-ubyte.gz", "7a0f934bd176c798ecba96b36fda6657"),
    ]),
    mirrors: &[],
    classes: &BYCLASS_CLASSES,
};

/// ByMerge folds the same visually ambiguous letter pairs as Balanced, so it
/// shares Balanced's 47 classes.
pub static EMNIST_BYMERGE: DatasetDescriptor = DatasetDescriptor {
    name: "ByMerge",
    aliases: &["emnist-bymerge", "emnist_bymerge"],
    resources: resources([
        ("emnist-bymerge-train-images-idx3-ubyte.gz", "4a792d4df261d7e1ba27979573bf53f3"),
        ("emnist-bymerge-train-labels-idx1-ubyte.gz", "491be69ef99e1ab1f5b7f9ccc908bb26"),
        ("emnist-bymerge-test-images-idx3-ubyte.gz", "8eb5d34c91f1759a55831c37ec2a283f"),
        ("emnist-bymerge-test-labels-idx1-ubyte.gz", "c13f4cd5211cdba1b8fa992dae2be992"),
    ]),
    mirrors: &[],
    classes: &BALANCED_CLASSES,
};

pub static EMNIST_DIGITS: DatasetDescriptor = DatasetDescriptor {
    name: "Digits",
    aliases: &["emnist-digits", "emnist_digits"],
    resources: resources([
        ("emnist-digits-train-images-idx3-ubyte.gz", "d2662ecdc47895a6bbfce25de9e9a677"),
        ("emnist-digits-train-labels-idx1-ubyte.gz", "2223fcfee618ac9c89ef20b6e48bcf9e"),
        ("emnist-digits-test-images-idx3-ubyte.gz", "a159b8b3bd6ab4ed4793c1cb71a2f5cc"),
        ("emnist-digits-test-labels-idx1-ubyte.gz", "8afde66ea51d865689083ba6bb779fac"),
    ]),
    mirrors: &[],
    classes: &DIGITS,
};

pub static EMNIST_LETTERS: DatasetDescriptor = DatasetDescriptor {
    name: "Letters",
    aliases: &["emnist-letters", "emnist_letters"],
    resources: resources([
        ("emnist-letters-train-images-idx3-ubyte.gz", "8795078f199c478165fe18db82625747"),
        ("emnist-letters-train-labels-idx1-ubyte.gz", "c16de4f1848ddcdddd39ab65d2a7be52"),
        ("emnist-letters-test-images-idx3-ubyte.gz", "382093a19703f68edac6d01b8dfdfcad"),
        ("emnist-letters-test-labels-idx1-ubyte.gz", "d4108920cd86601ec7689a97f2de7f59"),
    ]),
    mirrors: &[],
    classes: &LETTERS,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn is_md5_hex(s: &str) -> bool {
        s.len() == 32 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    #[test]
    fn test_resources_are_well_formed() {
        for d in DATASETS {
            for (kind, r) in ResourceKind::ALL.iter().zip(d.resources.iter()) {
                assert_eq!(r.kind, *kind, "{} {}", d.name, r.filename);
                assert!(is_md5_hex(r.md5), "{} {}", d.name, r.filename);
                assert!(r.filename.ends_with(".gz"));
            }
        }
        assert!(is_md5_hex(EMNIST.archive.md5));
    }

    #[test]
    fn test_mirrors_end_with_slash() {
        for d in DATASETS {
            assert!(d.mirrors.iter().all(|m| m.ends_with('/')), "{}", d.name);
        }
        for c in COMPOSITES {
            assert!(!c.mirrors.is_empty());
            assert!(c.mirrors.iter().all(|m| m.ends_with('/')));
        }
    }

    #[test]
    fn test_class_counts() {
        assert_eq!(MNIST.num_classes(), 10);
        assert_eq!(FASHION_MNIST.num_classes(), 10);
        assert_eq!(KMNIST.num_classes(), 10);
        assert_eq!(EMNIST_BALANCED.num_classes(), 47);
        assert_eq!(EMNIST_BYCLASS.num_classes(), 62);
        assert_eq!(EMNIST_BYMERGE.num_classes(), 47);
        assert_eq!(EMNIST_DIGITS.num_classes(), 10);
        assert_eq!(EMNIST_LETTERS.num_classes(), 26);
    }

    #[test]
    fn test_resource_lookup() {
        let r = MNIST.resource(ResourceKind::TestLabels);
        assert_eq!(r.filename, "t10k-labels-idx1-ubyte.gz");
        assert_eq!(ResourceKind::TestLabels.name(), "test_labels");
        assert!(ResourceKind::TrainImages.is_images());
        assert!(!ResourceKind::TrainLabels.is_images());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("mnist"), Some(Entry::Dataset(&MNIST)));
        assert_eq!(find("  Fashion-MNIST "), Some(Entry::Dataset(&FASHION_MNIST)));
        assert_eq!(find("kuzushiji-mnist"), Some(Entry::Dataset(&KMNIST)));
        assert_eq!(find("emnist"), Some(Entry::Composite(&EMNIST)));
        assert_eq!(find("EMNIST-Digits"), Some(Entry::Dataset(&EMNIST_DIGITS)));
        assert_eq!(find("kmnist49"), None);
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of(&EMNIST_LETTERS), Some(&EMNIST));
        assert_eq!(parent_of(&MNIST), None);
    }

    #[test]
    fn test_variant_lookup() {
        assert_eq!(EMNIST.variant("letters"), Some(&EMNIST_LETTERS));
        assert_eq!(EMNIST.variant("ByMerge"), Some(&EMNIST_BYMERGE));
        assert_eq!(EMNIST.variant("emnist-byclass"), Some(&EMNIST_BYCLASS));
        assert_eq!(EMNIST.variant("mnist"), None);
    }

    #[test]
    fn test_default_dirs() {
        assert!(MNIST.default_dir().ends_with("mnists/MNIST"));
        assert!(EMNIST.default_dir().ends_with("mnists/EMNIST"));
    }
}
