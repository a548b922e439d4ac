use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::KiraError;
use crate::store::{find_files_with_ext, has_ext};

pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, KiraError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, KiraError> {
        let unpacked = extract_tar(archive, target_dir)?;
        let mut raw_files = decompress_gz_members(target_dir)?;
        raw_files.extend(unpacked.into_iter().filter(|path| has_ext(path, "txt")));
        raw_files.sort();
        Ok(raw_files)
    }
}

pub fn extract_tar(tar_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, KiraError> {
    let file = File::open(tar_path)
        .map_err(|err| KiraError::Filesystem(format!("open tar {}: {err}", tar_path.display())))?;
    fs::create_dir_all(target_dir).map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let mut archive = Archive::new(BufReader::new(file));

    let entries = archive
        .entries()
        .map_err(|err| KiraError::Archive(err.to_string()))?;
    let mut files = Vec::new();
    for entry in entries {
        let mut entry = entry.map_err(|err| KiraError::Archive(err.to_string()))?;
        let relative = entry
            .path()
            .map_err(|err| KiraError::Archive(err.to_string()))?
            .into_owned();
        let is_file = entry.header().entry_type().is_file();
        // unpack_in refuses entries that would land outside target_dir
        let unpacked = entry
            .unpack_in(target_dir)
            .map_err(|err| KiraError::Archive(err.to_string()))?;
        if !unpacked {
            return Err(KiraError::Archive(
                "tar entry path traversal detected".to_string(),
            ));
        }
        if is_file {
            files.push(target_dir.join(relative));
        }
    }
    Ok(files)
}

// GSM1.txt.gz -> GSM1/GSM1.txt
pub fn decompress_gz_members(root: &Path) -> Result<Vec<PathBuf>, KiraError> {
    let mut produced = Vec::new();
    for gz_path in find_files_with_ext(root, "gz")? {
        let parent = gz_path
            .parent()
            .ok_or_else(|| KiraError::Filesystem("gzip member without parent".to_string()))?;
        let file_name = gz_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| KiraError::Filesystem("non-utf8 gzip member name".to_string()))?;
        let stem = raw_sample_stem(file_name);
        let output_dir = parent.join(&stem);
        fs::create_dir_all(&output_dir).map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let output_path = output_dir.join(format!("{stem}.txt"));

        gunzip_file(&gz_path, &output_path)?;
        fs::remove_file(&gz_path).map_err(|err| {
            KiraError::Filesystem(format!("remove {}: {err}", gz_path.display()))
        })?;
        produced.push(output_path);
    }
    Ok(produced)
}

pub fn gunzip_file(source: &Path, destination: &Path) -> Result<(), KiraError> {
    let input = File::open(source)
        .map_err(|err| KiraError::Filesystem(format!("open {}: {err}", source.display())))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut output = File::create(destination)
        .map_err(|err| KiraError::Filesystem(format!("create {}: {err}", destination.display())))?;
    io::copy(&mut decoder, &mut output)
        .map_err(|err| KiraError::Archive(format!("gunzip {}: {err}", source.display())))?;
    Ok(())
}

pub fn raw_sample_stem(file_name: &str) -> String {
    let once = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    Path::new(once)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(once)
        .to_string()
}

pub fn has_pending_gz(root: &Path) -> Result<bool, KiraError> {
    Ok(!find_files_with_ext(root, "gz")?.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn stem_strips_two_extensions() {
        assert_eq!(raw_sample_stem("GSM1_raw.txt.gz"), "GSM1_raw");
        assert_eq!(raw_sample_stem("GSM2.gz"), "GSM2");
    }

    #[test]
    fn tar_with_gzip_members_is_unpacked() {
        let temp = tempfile::tempdir().unwrap();
        let tar_path = temp.path().join("GSE1_RAW.tar");
        {
            let file = File::create(&tar_path).unwrap();
            let mut builder = tar::Builder::new(file);
            let payload = gzip(b"[Heading]\nA\tB\n");
            let mut header = tar::Header::new_gnu();
            header.set_size(payload.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "GSM1_sample.txt.gz", payload.as_slice())
                .unwrap();
            builder.finish().unwrap();
        }

        let target = temp.path().join("extracted");
        let files = TarGzExtractor.extract(&tar_path, &target).unwrap();

        let expected = target.join("GSM1_sample").join("GSM1_sample.txt");
        assert_eq!(files, vec![expected.clone()]);
        assert_eq!(fs::read_to_string(expected).unwrap(), "[Heading]\nA\tB\n");
        assert!(!has_pending_gz(&target).unwrap());
    }

    #[test]
    fn plain_and_gzip_members_are_both_reported() {
        let temp = tempfile::tempdir().unwrap();
        let tar_path = temp.path().join("GSE1_RAW.tar");
        {
            let file = File::create(&tar_path).unwrap();
            let mut builder = tar::Builder::new(file);
            for (name, payload) in [
                ("GSM2.txt", b"[Heading]\n".to_vec()),
                ("GSM1.txt.gz", gzip(b"[Heading]\n")),
                ("filelist.csv", b"name\n".to_vec()),
            ] {
                let mut header = tar::Header::new_gnu();
                header.set_size(payload.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append_data(&mut header, name, payload.as_slice()).unwrap();
            }
            builder.finish().unwrap();
        }

        let target = temp.path().join("extracted");
        let files = TarGzExtractor.extract(&tar_path, &target).unwrap();

        assert_eq!(
            files,
            vec![target.join("GSM1").join("GSM1.txt"), target.join("GSM2.txt")]
        );
    }
}
