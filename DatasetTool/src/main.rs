#![allow(non_snake_case)]

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use rand::seq::SliceRandom;
use rand::thread_rng;

const DEFAULT_IMAGES_DIR: &str = "raw_data/images";
const DEFAULT_LABELS_DIR: &str = "raw_data/labels";
const DEFAULT_OUTPUT_DIR: &str = "dataset";
const TRAIN_RATIO: f64 = 0.8;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn main() {
    let images_dir = env::var("IMAGES_SOURCE_DIR").unwrap_or_else(|_| DEFAULT_IMAGES_DIR.to_string());
    let labels_dir = env::var("LABELS_SOURCE_DIR").unwrap_or_else(|_| DEFAULT_LABELS_DIR.to_string());
    let output_dir = env::var("DATASET_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string());
    match split_dataset(Path::new(&images_dir), Path::new(&labels_dir), Path::new(&output_dir), TRAIN_RATIO) {
        Ok((train_count, val_count)) => {
            println!("Dataset organized in {output_dir}: {train_count} train, {val_count} val");
        },
        Err(err) => {
            eprintln!("Dataset split failed: {err}");
            std::process::exit(1);
        },
    }
}

fn split_dataset(images_dir: &Path, labels_dir: &Path, output_dir: &Path, train_ratio: f64) -> io::Result<(usize, usize)> {
    if !images_dir.is_dir() || !labels_dir.is_dir() {
        return Err(io::Error::new(io::ErrorKind::NotFound, format!("Could not find {} or {}", images_dir.display(), labels_dir.display())));
    }

    let mut images = list_images(images_dir)?;
    println!("Found {} images", images.len());
    images.shuffle(&mut thread_rng());

    for subset in ["train", "val"] {
        fs::create_dir_all(output_dir.join("images").join(subset))?;
        fs::create_dir_all(output_dir.join("labels").join(subset))?;
    }

    let split_point = (images.len() as f64 * train_ratio) as usize;
    let (train_images, val_images) = images.split_at(split_point);
    copy_subset(train_images, images_dir, labels_dir, output_dir, "train")?;
    copy_subset(val_images, images_dir, labels_dir, output_dir, "val")?;
    Ok((train_images.len(), val_images.len()))
}

fn list_images(images_dir: &Path) -> io::Result<Vec<String>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(images_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let extension = Path::new(file_name).extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            images.push(file_name.to_string());
        }
    }
    Ok(images)
}

//Labels are optional: an image without one still lands in its subset.
fn copy_subset(image_names: &[String], images_dir: &Path, labels_dir: &Path, output_dir: &Path, subset: &str) -> io::Result<()> {
    for image_name in image_names {
        fs::copy(images_dir.join(image_name), output_dir.join("images").join(subset).join(image_name))?;
        let label_name = label_name_for(image_name);
        let label_source = labels_dir.join(&label_name);
        if label_source.exists() {
            fs::copy(label_source, output_dir.join("labels").join(subset).join(&label_name))?;
        } else {
            println!("Warning: no label found for {image_name}");
        }
    }
    Ok(())
}

fn label_name_for(image_name: &str) -> String {
    let stem = Path::new(image_name).file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(image_name);
    format!("{stem}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TempTree {
        root: PathBuf,
    }

    impl TempTree {
        fn new(tag: &str) -> Self {
            let root = env::temp_dir().join(format!("dataset_tool_{tag}_{}", std::process::id()));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(root.join("images")).unwrap();
            fs::create_dir_all(root.join("labels")).unwrap();
            Self { root }
        }
    }

    impl Drop for TempTree {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    fn seed_images(tree: &TempTree, count: usize, with_labels: bool) {
        for index in 0..count {
            fs::write(tree.root.join("images").join(format!("pod_{index}.jpg")), b"jpeg bytes").unwrap();
            if with_labels {
                fs::write(tree.root.join("labels").join(format!("pod_{index}.txt")), b"0 0.5 0.5 0.2 0.2").unwrap();
            }
        }
    }

    #[test]
    fn splits_images_and_labels_into_train_and_val() {
        let tree = TempTree::new("split");
        seed_images(&tree, 10, true);
        let output = tree.root.join("out");
        let (train_count, val_count) = split_dataset(&tree.root.join("images"), &tree.root.join("labels"), &output, 0.8).unwrap();
        assert_eq!(train_count, 8);
        assert_eq!(val_count, 2);
        assert_eq!(fs::read_dir(output.join("images").join("train")).unwrap().count(), 8);
        assert_eq!(fs::read_dir(output.join("images").join("val")).unwrap().count(), 2);
        assert_eq!(fs::read_dir(output.join("labels").join("train")).unwrap().count(), 8);
        assert_eq!(fs::read_dir(output.join("labels").join("val")).unwrap().count(), 2);
    }

    #[test]
    fn tolerates_missing_labels() {
        let tree = TempTree::new("nolabels");
        seed_images(&tree, 5, false);
        let output = tree.root.join("out");
        let (train_count, val_count) = split_dataset(&tree.root.join("images"), &tree.root.join("labels"), &output, 0.8).unwrap();
        assert_eq!(train_count + val_count, 5);
        assert_eq!(fs::read_dir(output.join("labels").join("train")).unwrap().count(), 0);
    }

    #[test]
    fn missing_source_directories_are_an_error() {
        let tree = TempTree::new("missing");
        let result = split_dataset(&tree.root.join("nope"), &tree.root.join("labels"), &tree.root.join("out"), 0.8);
        assert!(result.is_err());
    }

    #[test]
    fn only_image_extensions_are_listed() {
        let tree = TempTree::new("filter");
        seed_images(&tree, 2, false);
        fs::write(tree.root.join("images").join("notes.txt"), b"not an image").unwrap();
        fs::write(tree.root.join("images").join("photo.PNG"), b"png bytes").unwrap();
        let images = list_images(&tree.root.join("images")).unwrap();
        assert_eq!(images.len(), 3);
        assert!(!images.iter().any(|name| name == "notes.txt"));
    }
}
