use bson::{Bson, Document as BsonDocument};

// Guards against abusive paths; out-of-range paths resolve to absence.
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_PATH_LEN: usize = 1024;

fn path_ok(path: &str) -> bool {
    !path.is_empty()
        && path.len() <= MAX_PATH_LEN
        && path.split('.').count() <= MAX_PATH_DEPTH
}

/// Resolve a dotted path against nested sub-documents.
pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if !path_ok(path) {
        return None;
    }
    let mut cur = doc;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.get(seg);
        }
        match cur.get(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

pub fn get_path_mut<'a>(doc: &'a mut BsonDocument, path: &str) -> Option<&'a mut Bson> {
    if !path_ok(path) {
        return None;
    }
    let mut cur = doc;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.get_mut(seg);
        }
        match cur.get_mut(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

pub fn has_path(doc: &BsonDocument, path: &str) -> bool {
    get_path(doc, path).is_some()
}

/// Delete the field at a dotted path, descending through arrays of
/// sub-documents along the way: deleting `a.b` from `{a: [{b:1},{b:2}]}`
/// removes `b` from every element. Returns whether anything was removed.
pub fn delete_path(doc: &mut BsonDocument, path: &str) -> bool {
    if !path_ok(path) {
        return false;
    }
    delete_inner(doc, path)
}

fn delete_inner(doc: &mut BsonDocument, path: &str) -> bool {
    match path.split_once('.') {
        None => doc.remove(path).is_some(),
        Some((head, rest)) => match doc.get_mut(head) {
            Some(Bson::Document(d)) => delete_inner(d, rest),
            Some(Bson::Array(items)) => {
                let mut removed = false;
                for item in items {
                    if let Bson::Document(d) = item
                        && delete_inner(d, rest)
                    {
                        removed = true;
                    }
                }
                removed
            }
            _ => false,
        },
    }
}
