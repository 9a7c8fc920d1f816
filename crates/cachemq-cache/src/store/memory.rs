//! In-process store executor for tests.
//!
//! Answers the same command descriptors as the remote store with RESP-shaped
//! replies, so the typed decoding in the cache client runs unchanged. Only
//! the commands the cache client issues are understood.

use async_trait::async_trait;
use redis::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use cachemq_domain::{ClientError, Result};

use super::{Command, StoreExecutor};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(HashSet<String>),
    ZSet(HashMap<String, f64>),
}

impl Entry {
    fn is_empty(&self) -> bool {
        match self {
            Self::Str(_) => false,
            Self::Hash(h) => h.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Set(s) => s.is_empty(),
            Self::ZSet(z) => z.is_empty(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    entry: Entry,
    expires_at: Option<Instant>,
}

type Data = HashMap<String, Slot>;

/// In-memory stand-in for the remote store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let mut data = self.data.lock().await;
        purge_expired(&mut data);
        data.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StoreExecutor for MemoryStore {
    async fn execute(&self, command: Command) -> Result<Value> {
        let mut data = self.data.lock().await;
        purge_expired(&mut data);

        let key = command.key().unwrap_or_default().to_string();
        let args: Vec<String> = command
            .args()
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect();

        match command.name() {
            "PING" => Ok(Value::SimpleString("PONG".into())),

            // Keys
            "EXPIRE" => {
                let secs = parse_int(arg(&args, 0)?)?;
                Ok(match data.get_mut(&key) {
                    Some(slot) => {
                        slot.expires_at =
                            Some(Instant::now() + Duration::from_secs(secs.unsigned_abs()));
                        Value::Int(1)
                    }
                    None => Value::Int(0),
                })
            }
            "TTL" => Ok(Value::Int(match data.get(&key) {
                None => -2,
                Some(Slot {
                    expires_at: None, ..
                }) => -1,
                Some(Slot {
                    expires_at: Some(at),
                    ..
                }) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    i64::try_from((remaining.as_millis() + 500) / 1000).unwrap_or(i64::MAX)
                }
            })),
            "EXISTS" => Ok(count(
                std::iter::once(&key)
                    .chain(&args)
                    .filter(|k| data.contains_key(*k))
                    .count(),
            )),
            "DEL" => Ok(count(
                std::iter::once(&key)
                    .chain(&args)
                    .filter(|k| data.remove(*k).is_some())
                    .count(),
            )),

            // Strings
            "GET" => match data.get(&key).map(|s| &s.entry) {
                None => Ok(Value::Nil),
                Some(Entry::Str(s)) => Ok(bulk(s)),
                Some(_) => Err(wrong_type()),
            },
            "SET" => {
                let value = arg(&args, 0)?.to_string();
                let expires_at = match (args.get(1).map(String::as_str), args.get(2)) {
                    (Some("EX"), Some(secs)) => Some(
                        Instant::now() + Duration::from_secs(parse_int(secs)?.unsigned_abs()),
                    ),
                    _ => None,
                };
                data.insert(
                    key,
                    Slot {
                        entry: Entry::Str(value),
                        expires_at,
                    },
                );
                Ok(Value::Okay)
            }
            name @ ("INCRBY" | "DECRBY") => {
                let mut delta = parse_int(arg(&args, 0)?)?;
                if name == "DECRBY" {
                    delta = -delta;
                }
                let slot = data.entry(key).or_insert_with(|| Slot {
                    entry: Entry::Str("0".into()),
                    expires_at: None,
                });
                let Entry::Str(current) = &mut slot.entry else {
                    return Err(wrong_type());
                };
                let value = current
                    .parse::<i64>()
                    .map_err(|_| {
                        ClientError::TypeMismatch("value is not an integer or out of range".into())
                    })?
                    .checked_add(delta)
                    .ok_or_else(|| ClientError::protocol("increment or decrement would overflow"))?;
                *current = value.to_string();
                Ok(Value::Int(value))
            }

            // Hashes
            "HGET" => {
                let field = arg(&args, 0)?;
                Ok(match hash(&data, &key)? {
                    Some(h) => h.get(field).map_or(Value::Nil, |v| bulk(v)),
                    None => Value::Nil,
                })
            }
            "HGETALL" => Ok(Value::Array(
                hash(&data, &key)?
                    .into_iter()
                    .flatten()
                    .flat_map(|(f, v)| [bulk(f), bulk(v)])
                    .collect(),
            )),
            "HEXISTS" => {
                let field = arg(&args, 0)?;
                Ok(flag(
                    hash(&data, &key)?.is_some_and(|h| h.contains_key(field)),
                ))
            }
            "HSET" => {
                if args.is_empty() || args.len() % 2 != 0 {
                    return Err(ClientError::protocol(
                        "wrong number of arguments for 'hset' command",
                    ));
                }
                let h = hash_mut(&mut data, &key)?;
                let added = args
                    .chunks(2)
                    .filter(|pair| h.insert(pair[0].clone(), pair[1].clone()).is_none())
                    .count();
                Ok(count(added))
            }
            "HDEL" => {
                let removed = match existing_mut(&mut data, &key) {
                    Some(Entry::Hash(h)) => args.iter().filter(|f| h.remove(*f).is_some()).count(),
                    Some(_) => return Err(wrong_type()),
                    None => 0,
                };
                drop_if_empty(&mut data, &key);
                Ok(count(removed))
            }
            "HINCRBY" => {
                let field = arg(&args, 0)?.to_string();
                let delta = parse_int(arg(&args, 1)?)?;
                let h = hash_mut(&mut data, &key)?;
                let current = h.entry(field).or_insert_with(|| "0".into());
                let value = current
                    .parse::<i64>()
                    .map_err(|_| ClientError::TypeMismatch("hash value is not an integer".into()))?
                    .checked_add(delta)
                    .ok_or_else(|| ClientError::protocol("increment or decrement would overflow"))?;
                *current = value.to_string();
                Ok(Value::Int(value))
            }

            // Lists
            "LRANGE" => {
                let start = parse_int(arg(&args, 0)?)?;
                let stop = parse_int(arg(&args, 1)?)?;
                let items = match data.get(&key).map(|s| &s.entry) {
                    None => Vec::new(),
                    Some(Entry::List(l)) => match normalize_range(l.len(), start, stop) {
                        Some((from, to)) => l.range(from..=to).map(|v| bulk(v)).collect(),
                        None => Vec::new(),
                    },
                    Some(_) => return Err(wrong_type()),
                };
                Ok(Value::Array(items))
            }
            "LLEN" => match data.get(&key).map(|s| &s.entry) {
                None => Ok(Value::Int(0)),
                Some(Entry::List(l)) => Ok(count(l.len())),
                Some(_) => Err(wrong_type()),
            },
            "RPUSH" => {
                let slot = data.entry(key).or_insert_with(|| Slot {
                    entry: Entry::List(VecDeque::new()),
                    expires_at: None,
                });
                let Entry::List(l) = &mut slot.entry else {
                    return Err(wrong_type());
                };
                l.extend(args);
                Ok(count(l.len()))
            }
            "RPOP" => {
                let popped = match existing_mut(&mut data, &key) {
                    Some(Entry::List(l)) => l.pop_back(),
                    Some(_) => return Err(wrong_type()),
                    None => None,
                };
                drop_if_empty(&mut data, &key);
                Ok(popped.map_or(Value::Nil, |v| bulk(&v)))
            }

            // Sets
            "SMEMBERS" => match data.get(&key).map(|s| &s.entry) {
                None => Ok(Value::Array(Vec::new())),
                Some(Entry::Set(s)) => Ok(Value::Array(s.iter().map(|m| bulk(m)).collect())),
                Some(_) => Err(wrong_type()),
            },
            "SISMEMBER" => {
                let member = arg(&args, 0)?;
                match data.get(&key).map(|s| &s.entry) {
                    None => Ok(flag(false)),
                    Some(Entry::Set(s)) => Ok(flag(s.contains(member))),
                    Some(_) => Err(wrong_type()),
                }
            }
            "SADD" => {
                let slot = data.entry(key).or_insert_with(|| Slot {
                    entry: Entry::Set(HashSet::new()),
                    expires_at: None,
                });
                let Entry::Set(s) = &mut slot.entry else {
                    return Err(wrong_type());
                };
                Ok(count(args.into_iter().filter(|m| s.insert(m.clone())).count()))
            }
            "SREM" => {
                let removed = match existing_mut(&mut data, &key) {
                    Some(Entry::Set(s)) => args.iter().filter(|m| s.remove(*m)).count(),
                    Some(_) => return Err(wrong_type()),
                    None => 0,
                };
                drop_if_empty(&mut data, &key);
                Ok(count(removed))
            }

            // Sorted sets
            "ZADD" => {
                if args.is_empty() || args.len() % 2 != 0 {
                    return Err(ClientError::protocol(
                        "wrong number of arguments for 'zadd' command",
                    ));
                }
                let mut pairs = Vec::with_capacity(args.len() / 2);
                for pair in args.chunks(2) {
                    let score = pair[0]
                        .parse::<f64>()
                        .map_err(|_| ClientError::TypeMismatch("value is not a valid float".into()))?;
                    pairs.push((score, pair[1].clone()));
                }
                let slot = data.entry(key).or_insert_with(|| Slot {
                    entry: Entry::ZSet(HashMap::new()),
                    expires_at: None,
                });
                let Entry::ZSet(z) = &mut slot.entry else {
                    return Err(wrong_type());
                };
                let added = pairs
                    .into_iter()
                    .filter(|(score, member)| z.insert(member.clone(), *score).is_none())
                    .count();
                Ok(count(added))
            }
            "ZRANGE" => {
                let start = parse_int(arg(&args, 0)?)?;
                let stop = parse_int(arg(&args, 1)?)?;
                let items = match data.get(&key).map(|s| &s.entry) {
                    None => Vec::new(),
                    Some(Entry::ZSet(z)) => {
                        let mut ordered: Vec<(&String, &f64)> = z.iter().collect();
                        ordered.sort_by(|a, b| a.1.total_cmp(b.1).then_with(|| a.0.cmp(b.0)));
                        match normalize_range(ordered.len(), start, stop) {
                            Some((from, to)) => {
                                ordered[from..=to].iter().map(|(m, _)| bulk(m)).collect()
                            }
                            None => Vec::new(),
                        }
                    }
                    Some(_) => return Err(wrong_type()),
                };
                Ok(Value::Array(items))
            }
            "ZSCORE" => {
                let member = arg(&args, 0)?;
                match data.get(&key).map(|s| &s.entry) {
                    None => Ok(Value::Nil),
                    Some(Entry::ZSet(z)) => {
                        Ok(z.get(member).map_or(Value::Nil, |score| bulk(&score.to_string())))
                    }
                    Some(_) => Err(wrong_type()),
                }
            }
            "ZREM" => {
                let removed = match existing_mut(&mut data, &key) {
                    Some(Entry::ZSet(z)) => args.iter().filter(|m| z.remove(*m).is_some()).count(),
                    Some(_) => return Err(wrong_type()),
                    None => 0,
                };
                drop_if_empty(&mut data, &key);
                Ok(count(removed))
            }

            other => Err(ClientError::protocol(format!("unknown command '{other}'"))),
        }
    }
}

fn purge_expired(data: &mut Data) {
    let now = Instant::now();
    data.retain(|_, slot| slot.expires_at.is_none_or(|at| at > now));
}

fn existing_mut<'a>(data: &'a mut Data, key: &str) -> Option<&'a mut Entry> {
    data.get_mut(key).map(|slot| &mut slot.entry)
}

fn drop_if_empty(data: &mut Data, key: &str) {
    if data.get(key).is_some_and(|slot| slot.entry.is_empty()) {
        data.remove(key);
    }
}

fn hash<'a>(data: &'a Data, key: &str) -> Result<Option<&'a HashMap<String, String>>> {
    match data.get(key).map(|s| &s.entry) {
        None => Ok(None),
        Some(Entry::Hash(h)) => Ok(Some(h)),
        Some(_) => Err(wrong_type()),
    }
}

fn hash_mut<'a>(data: &'a mut Data, key: &str) -> Result<&'a mut HashMap<String, String>> {
    let slot = data.entry(key.to_string()).or_insert_with(|| Slot {
        entry: Entry::Hash(HashMap::new()),
        expires_at: None,
    });
    match &mut slot.entry {
        Entry::Hash(h) => Ok(h),
        _ => Err(wrong_type()),
    }
}

/// Resolve inclusive `start..=stop` with negative indexes counted from the tail.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

fn arg(args: &[String], index: usize) -> Result<&str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| ClientError::protocol("wrong number of arguments"))
}

fn parse_int(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| ClientError::TypeMismatch("value is not an integer or out of range".into()))
}

fn bulk(value: &str) -> Value {
    Value::BulkString(value.as_bytes().to_vec())
}

fn count(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn flag(value: bool) -> Value {
    Value::Int(i64::from(value))
}

fn wrong_type() -> ClientError {
    ClientError::TypeMismatch(WRONGTYPE.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(5, 0, -1), Some((0, 4)));
        assert_eq!(normalize_range(5, 1, 2), Some((1, 2)));
        assert_eq!(normalize_range(5, -2, -1), Some((3, 4)));
        assert_eq!(normalize_range(5, 0, 100), Some((0, 4)));
        assert_eq!(normalize_range(5, 6, 8), None);
        assert_eq!(normalize_range(5, 3, 1), None);
        assert_eq!(normalize_range(0, 0, -1), None);
    }

    #[tokio::test]
    async fn test_wrong_type_is_reported() {
        let store = MemoryStore::new();
        store
            .execute(Command::new("SET", "greeting").arg("hi"))
            .await
            .unwrap();

        let err = store
            .execute(Command::new("RPUSH", "greeting").arg("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TypeMismatch(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_collections_are_removed() {
        let store = MemoryStore::new();
        store
            .execute(Command::new("SADD", "tags").arg("a"))
            .await
            .unwrap();
        store
            .execute(Command::new("SREM", "tags").arg("a"))
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }
}
