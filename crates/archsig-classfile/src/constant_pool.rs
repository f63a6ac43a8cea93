use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone)]
enum Constant {
    /// Slot 0 and the second slot of long/double entries.
    Unusable,
    Utf8(String),
    Integer,
    Float,
    Long,
    Double,
    Class { name_index: u16 },
    String,
    MemberRef,
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle,
    MethodType,
    Dynamic,
    Module,
    Package,
}

impl Constant {
    fn kind(&self) -> &'static str {
        match self {
            Constant::Unusable => "unusable",
            Constant::Utf8(_) => "Utf8",
            Constant::Integer => "Integer",
            Constant::Float => "Float",
            Constant::Long => "Long",
            Constant::Double => "Double",
            Constant::Class { .. } => "Class",
            Constant::String => "String",
            Constant::MemberRef => "MemberRef",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle => "MethodHandle",
            Constant::MethodType => "MethodType",
            Constant::Dynamic => "Dynamic",
            Constant::Module => "Module",
            Constant::Package => "Package",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let constant = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.read_bytes(len)?)?)
                }
                3 => {
                    reader.read_u4()?;
                    Constant::Integer
                }
                4 => {
                    reader.read_u4()?;
                    Constant::Float
                }
                5 | 6 => {
                    reader.read_bytes(8)?;
                    entries.push(if tag == 5 {
                        Constant::Long
                    } else {
                        Constant::Double
                    });
                    // 8-byte constants take up two slots.
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => {
                    reader.read_u2()?;
                    Constant::String
                }
                9..=11 => {
                    reader.read_u2()?;
                    reader.read_u2()?;
                    Constant::MemberRef
                }
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => {
                    reader.read_u1()?;
                    reader.read_u2()?;
                    Constant::MethodHandle
                }
                16 => {
                    reader.read_u2()?;
                    Constant::MethodType
                }
                17 | 18 => {
                    reader.read_u2()?;
                    reader.read_u2()?;
                    Constant::Dynamic
                }
                19 => {
                    reader.read_u2()?;
                    Constant::Module
                }
                20 => {
                    reader.read_u2()?;
                    Constant::Package
                }
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };
            entries.push(constant);
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(Error::InvalidConstantPoolIndex(index)),
            Some(constant) => Ok(constant),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
                found: other.kind(),
            }),
        }
    }

    /// Returns `(name, descriptor)` of a `NameAndType` entry.
    pub(crate) fn get_name_and_type(&self, index: u16) -> Result<(String, String)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((
                self.get_utf8(*name_index)?.to_string(),
                self.get_utf8(*descriptor_index)?.to_string(),
            )),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "NameAndType",
                found: other.kind(),
            }),
        }
    }
}

fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            if b == 0 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
            if b2 & 0xC0 != 0x80 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push((((b & 0x1F) as u16) << 6) | (b2 & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
            let b3 = *bytes.get(i + 2).ok_or(Error::InvalidModifiedUtf8)?;
            if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push(
                (((b & 0x0F) as u16) << 12) | (((b2 & 0x3F) as u16) << 6) | (b3 & 0x3F) as u16,
            );
            i += 3;
        } else {
            return Err(Error::InvalidModifiedUtf8);
        }
    }

    // Supplementary characters are encoded as surrogate pairs of 3-byte sequences.
    String::from_utf16(&units).map_err(|_| Error::InvalidModifiedUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modified_utf8_handles_nul_and_surrogates() {
        assert_eq!(decode_modified_utf8(b"Foo").unwrap(), "Foo");
        assert_eq!(decode_modified_utf8(&[0xC0, 0x80]).unwrap(), "\0");
        // U+1F600 as a surrogate pair (D83D DE00), each encoded in three bytes.
        let bytes = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert_eq!(decode_modified_utf8(&bytes).unwrap(), "\u{1F600}");
        assert!(decode_modified_utf8(&[0x00]).is_err());
        assert!(decode_modified_utf8(&[0xC3]).is_err());
    }

    #[test]
    fn long_constants_take_two_slots() {
        let mut bytes = vec![0x00, 0x05];
        bytes.push(5);
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&[1, 0x00, 0x01, b'X']);
        bytes.extend_from_slice(&[7, 0x00, 0x03]);

        let mut reader = Reader::new(&bytes);
        let pool = ConstantPool::parse(&mut reader).unwrap();
        reader.ensure_empty().unwrap();

        assert!(matches!(
            pool.get_utf8(2),
            Err(Error::InvalidConstantPoolIndex(2))
        ));
        assert_eq!(pool.get_utf8(3).unwrap(), "X");
        assert_eq!(pool.get_class_name(4).unwrap(), "X");
        assert!(matches!(
            pool.get_class_name(3),
            Err(Error::ConstantPoolTypeMismatch {
                expected: "Class",
                ..
            })
        ));
    }
}
