use actix_multipart::{Field, Multipart};
use actix_web::{
    http::header,
    web::{self, BytesMut},
    HttpRequest,
};
use futures_util::StreamExt;
use serde_json::Value;

use crate::{
    document::Fields,
    errors::{Error, Result},
    upload::{UploadReceiver, UploadedFile, IMAGE_FIELD},
};

/// Largest JSON body accepted on a write.
pub const JSON_LIMIT: usize = 100 * 1024;

/// Largest text field accepted in a multipart form.
pub const FIELD_SIZE_LIMIT: usize = 1024 * 1024;

/// A decoded write request: the submitted fields and the image, if any,
/// already stored on local disk.
pub struct WriteBody {
    pub fields: Fields,
    pub image: Option<UploadedFile>,
}

pub async fn read(
    req: &HttpRequest,
    payload: web::Payload,
    uploads: &UploadReceiver,
    collection: &str,
) -> Result<WriteBody> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        read_multipart(req, payload, uploads, collection).await
    } else if is_json(&content_type) {
        Ok(WriteBody {
            fields: read_json(payload).await?,
            image: None,
        })
    } else {
        Ok(WriteBody {
            fields: Fields::new(),
            image: None,
        })
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence == "application/json" || essence.ends_with("+json")
}

async fn read_json(mut payload: web::Payload) -> Result<Fields> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| Error::BadRequest(e.to_string()))?;
        if body.len() + chunk.len() > JSON_LIMIT {
            return Err(Error::BadRequest("body exceeds JSON limit".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(Error::BadRequest("body must be a JSON object".to_string())),
        Err(e) => Err(Error::BadRequest(e.to_string())),
    }
}

async fn read_multipart(
    req: &HttpRequest,
    payload: web::Payload,
    uploads: &UploadReceiver,
    collection: &str,
) -> Result<WriteBody> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut fields = Fields::new();
    let mut image = None;

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(|e| Error::BadRequest(e.to_string()))?;
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        match file_name {
            // A file input left empty still sends a part, with an empty filename.
            Some(file_name) if file_name.is_empty() => drain(&mut field).await?,
            Some(file_name) => {
                if name != IMAGE_FIELD {
                    return Err(Error::BadRequest(format!("unexpected file field '{}'", name)));
                }
                if image.is_some() {
                    return Err(Error::BadRequest(format!(
                        "more than one file under '{}'",
                        IMAGE_FIELD
                    )));
                }
                image = Some(stream_upload(&mut field, uploads, collection, &file_name).await?);
            }
            None => {
                let value = read_text(&mut field, &name).await?;
                append_field(&mut fields, &name, value);
            }
        }
    }

    Ok(WriteBody { fields, image })
}

/// Writes the file part to disk as it arrives; it is never held in memory.
async fn stream_upload(
    field: &mut Field,
    uploads: &UploadReceiver,
    collection: &str,
    file_name: &str,
) -> Result<UploadedFile> {
    let mut writer = uploads.open(collection, file_name).await?;
    while let Some(chunk) = field.next().await {
        let written = match chunk {
            Ok(chunk) => writer.write(&chunk).await,
            Err(e) => Err(Error::BadRequest(e.to_string())),
        };
        if let Err(e) = written {
            writer.abort().await;
            return Err(e);
        }
    }
    writer.finish().await
}

async fn read_text(field: &mut Field, name: &str) -> Result<String> {
    let mut contents = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| Error::BadRequest(e.to_string()))?;
        if contents.len() + chunk.len() > FIELD_SIZE_LIMIT {
            return Err(Error::BadRequest(format!(
                "field '{}' exceeds {} bytes",
                name, FIELD_SIZE_LIMIT
            )));
        }
        contents.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&contents).into_owned())
}

async fn drain(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| Error::BadRequest(e.to_string()))?;
    }
    Ok(())
}

/// Folds one form value into `fields` using bracket notation: `meta[x]`
/// nests under `meta`, `tags[]` appends to a list, and a plain name sent more
/// than once collects its values into a list. A bracketed name that clashes
/// with a value already stored is kept verbatim instead.
fn append_field(fields: &mut Fields, name: &str, value: String) {
    let value = Value::String(value);
    match field_path(name) {
        Some(path) => {
            if let Err(value) = insert_path(fields, &path, value) {
                push_value(fields, name, value);
            }
        }
        None => push_value(fields, name, value),
    }
}

/// `a[b][]` splits into `a`, `b` and an empty segment. Names outside that
/// grammar give `None`.
fn field_path(name: &str) -> Option<Vec<&str>> {
    let open = name.find('[')?;
    if open == 0 {
        return None;
    }
    let mut path = vec![&name[..open]];
    let mut rest = &name[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        path.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    Some(path)
}

fn insert_path(map: &mut Fields, path: &[&str], value: Value) -> std::result::Result<(), Value> {
    match path {
        [] => Err(value),
        [key] => {
            push_value(map, key, value);
            Ok(())
        }
        [key, last] if last.is_empty() => {
            match map
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => {
                    items.push(value);
                    Ok(())
                }
                _ => Err(value),
            }
        }
        [key, rest @ ..] => {
            match map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Fields::new()))
            {
                Value::Object(child) => insert_path(child, rest, value),
                _ => Err(value),
            }
        }
    }
}

fn push_value(map: &mut Fields, key: &str, value: Value) {
    match map.get_mut(key) {
        None => {
            map.insert(key.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}
