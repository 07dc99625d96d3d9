extern crate anyhow;
extern crate image;
extern crate reqwest;
extern crate serde_json;
extern crate std;

pub type SeguiResult<T> = std::result::Result<T, SeguiError>;

#[derive(Debug)]
pub enum SeguiError {
    HttpError(reqwest::Error),
    ImageError(image::ImageError),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    UrlError(String),
    OtherError(anyhow::Error),
}

pub fn make_error(msg: &str) -> SeguiError {
    return SeguiError::OtherError(anyhow::anyhow!("{}", msg));
}

impl std::fmt::Display for SeguiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            SeguiError::HttpError(ref err) => {
                return write!(f, "HTTP Error: {}", err);
            },
            SeguiError::ImageError(ref err) => {
                return write!(f, "Image Error: {}", err);
            },
            SeguiError::IoError(ref err) => {
                return write!(f, "IO Error: {}", err);
            },
            SeguiError::JsonError(ref err) => {
                return write!(f, "JSON Error: {}", err);
            },
            SeguiError::UrlError(ref msg) => {
                return write!(f, "URL Error: {}", msg);
            },
            SeguiError::OtherError(ref err) => {
                return write!(f, "Error: {:#}", err);
            },
        }
    }
}

impl std::error::Error for SeguiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            SeguiError::HttpError(ref err) => Some(err),
            SeguiError::ImageError(ref err) => Some(err),
            SeguiError::IoError(ref err) => Some(err),
            SeguiError::JsonError(ref err) => Some(err),
            SeguiError::UrlError(_) => None,
            SeguiError::OtherError(ref err) => Some(&**err),
        }
    }
}

impl From<reqwest::Error> for SeguiError {
    fn from(err: reqwest::Error) -> SeguiError {
        return SeguiError::HttpError(err);
    }
}

impl From<image::ImageError> for SeguiError {
    fn from(err: image::ImageError) -> SeguiError {
        return SeguiError::ImageError(err);
    }
}

impl From<std::io::Error> for SeguiError {
    fn from(err: std::io::Error) -> SeguiError {
        return SeguiError::IoError(err);
    }
}

impl From<serde_json::Error> for SeguiError {
    fn from(err: serde_json::Error) -> SeguiError {
        return SeguiError::JsonError(err);
    }
}

impl From<anyhow::Error> for SeguiError {
    fn from(err: anyhow::Error) -> SeguiError {
        return SeguiError::OtherError(err);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn make_error_keeps_message() {
        let err = super::make_error("line not selected");
        assert_eq!("Error: line not selected", format!("{}", err));
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<Vec<i32>, serde_json::Error> = serde_json::from_str("[1,");
        let err: super::SeguiError = parse.unwrap_err().into();
        assert!(format!("{}", err).starts_with("JSON Error:"));
    }
}
