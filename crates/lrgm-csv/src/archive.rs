//! Zip packing and unpacking.

use std::io::{Cursor, Read, Write};

use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::{CsvTables, Result, UploadedFile};

pub(crate) fn pack(tables: &CsvTables) -> Result<Vec<u8>> {
  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
  let options =
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  for (name, contents) in tables.files() {
    zip.start_file(name, options)?;
    zip.write_all(contents.as_bytes())?;
  }

  Ok(zip.finish()?.into_inner())
}

pub(crate) fn unpack(bytes: &[u8]) -> Result<Vec<UploadedFile>> {
  let mut archive = ZipArchive::new(Cursor::new(bytes))?;
  let mut files = Vec::with_capacity(archive.len());

  for index in 0..archive.len() {
    let mut entry = archive.by_index(index)?;
    if entry.is_dir() {
      continue;
    }
    let name = entry
      .name()
      .rsplit('/')
      .next()
      .unwrap_or_default()
      .to_owned();
    let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry.read_to_end(&mut data)?;
    files.push(UploadedFile::new(name, data));
  }

  Ok(files)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ACTIVITIES_FILE, CAMPAIGNS_FILE, CONTACTS_FILE};

  fn tables() -> CsvTables {
    CsvTables {
      contacts:   "id,firstName\r\na1,Jane\r\n".into(),
      campaigns:  "id,title\r\n".into(),
      activities: "id,summary\r\n".into(),
    }
  }

  #[test]
  fn archive_holds_the_three_tables() {
    let files = unpack(&pack(&tables()).unwrap()).unwrap();

    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, [CONTACTS_FILE, CAMPAIGNS_FILE, ACTIVITIES_FILE]);
    assert_eq!(&files[0].data[..], b"id,firstName\r\na1,Jane\r\n");
  }

  #[test]
  fn nested_entries_are_flattened() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.add_directory("export/", options).unwrap();
    zip.start_file("export/contacts.csv", options).unwrap();
    zip.write_all(b"id\r\n").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let files = unpack(&bytes).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "contacts.csv");
  }

  #[test]
  fn garbage_is_an_error() {
    assert!(unpack(b"definitely not a zip").is_err());
  }
}
