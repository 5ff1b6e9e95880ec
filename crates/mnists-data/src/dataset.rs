// Dataset trait — sample-by-sample view over loaded tensors

use mnists_core::Tensor;

use crate::error::{Error, Result};

/// A single sample: a pair of (input features, label/target).
///
/// Both are stored as `Vec<f64>` with their associated shapes so they can be
/// batched into tensors later.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Input feature vector (flattened).
    pub features: Vec<f64>,
    /// Shape of the feature tensor (e.g. `[28, 28]` for MNIST).
    pub feature_shape: Vec<usize>,
    /// Target / label value(s) (flattened). For classification this is a
    /// single-element vec holding the class index as `f64`.
    pub target: Vec<f64>,
    /// Shape of the target tensor (`[1]` for a class index).
    pub target_shape: Vec<usize>,
}

/// A dataset is an indexed collection of samples.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// # Panics
    /// May panic if `index >= self.len()`.
    fn get(&self, index: usize) -> Sample;

    /// The shape of a single feature sample (without the sample axis).
    fn feature_shape(&self) -> &[usize];

    /// The shape of a single target sample (without the sample axis).
    fn target_shape(&self) -> &[usize];

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Train or test half of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

// SplitView — borrows the image and label tensors of one split
//
// Images are `[n, ...]` and labels are `[n]`; sample `i` is the `i`-th slab of
// the images with the `i`-th label as its target. Both tensors are stored
// contiguously, so a sample is a plain range of the backing storage.

/// One split of a loaded dataset, viewed as a [`Dataset`].
#[derive(Debug, Clone)]
pub struct SplitView<'a> {
    name: String,
    images: &'a Tensor,
    labels: &'a Tensor,
    classes: &'static [&'static str],
    feature_shape: Vec<usize>,
    target_shape: Vec<usize>,
}

impl<'a> SplitView<'a> {
    /// Pair an image tensor with its labels.
    ///
    /// Fails if the images have no sample axis, the labels are not
    /// one-dimensional, or the two disagree on the number of samples.
    pub fn new(
        name: impl Into<String>,
        split: Split,
        images: &'a Tensor,
        labels: &'a Tensor,
        classes: &'static [&'static str],
    ) -> Result<Self> {
        let images_n = images.shape().dim(0)?;
        let labels_n = match labels.dims() {
            [n] => *n,
            _ => {
                return Err(Error::Tensor(mnists_core::Error::msg(format!(
                    "labels must be one-dimensional, got shape {}",
                    labels.shape()
                ))))
            }
        };
        if images_n != labels_n {
            return Err(Error::SampleCountMismatch {
                split: split.name(),
                images: images_n,
                labels: labels_n,
            });
        }

        Ok(Self {
            name: format!("{}/{}", name.into(), split.name()),
            images,
            labels,
            classes,
            feature_shape: images.dims()[1..].to_vec(),
            target_shape: vec![1],
        })
    }

    pub fn images(&self) -> &'a Tensor {
        self.images
    }

    pub fn labels(&self) -> &'a Tensor {
        self.labels
    }

    /// Class index of sample `index`.
    pub fn label(&self, index: usize) -> Option<usize> {
        if index >= self.len() {
            return None;
        }
        let v = self.labels.storage().get_f64(index);
        (v >= 0.0).then_some(v as usize)
    }

    /// Class name of sample `index`, if its label is within the class list.
    pub fn class_name(&self, index: usize) -> Option<&'static str> {
        self.label(index).and_then(|l| self.classes.get(l).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

impl Dataset for SplitView<'_> {
    fn len(&self) -> usize {
        self.labels.elem_count()
    }

    fn get(&self, index: usize) -> Sample {
        assert!(index < self.len(), "index {index} out of range for {} samples", self.len());
        let per = self.feature_shape.iter().product::<usize>();
        let storage = self.images.storage();
        let features = (index * per..(index + 1) * per)
            .map(|i| storage.get_f64(i))
            .collect();
        Sample {
            features,
            feature_shape: self.feature_shape.clone(),
            target: vec![self.labels.storage().get_f64(index)],
            target_shape: self.target_shape.clone(),
        }
    }

    fn feature_shape(&self) -> &[usize] {
        &self.feature_shape
    }

    fn target_shape(&self) -> &[usize] {
        &self.target_shape
    }

    fn name(&self) -> &str {
        &self.name
    }
}
