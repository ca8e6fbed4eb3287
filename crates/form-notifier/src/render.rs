//! Notification message rendering
//!
//! Produces the plain-text and HTML bodies for a submission. The HTML body
//! is assembled only from [`Html`] fragments, so every interpolated value has
//! either been escaped or is static markup from this module.

use std::fmt;

use crate::types::Language;

/// A piece of markup that is safe to splice into the HTML body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    /// Escape untrusted text
    pub fn escape(text: &str) -> Self {
        Html(escape_html(text))
    }

    /// Static markup written in this crate
    fn trusted(markup: &'static str) -> Self {
        Html(markup.to_string())
    }

    /// Escaped text, or `placeholder` when the text is empty
    fn escape_or(text: &str, placeholder: &'static str) -> Self {
        if text.is_empty() {
            Html::trusted(placeholder)
        } else {
            Html::escape(text)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute contexts
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const NO_VALUE_TEXT: &str = "[no value]";
const UNKNOWN_TEXT: &str = "[unknown]";
const NO_VALUE_HTML: &str = "[<span style='font-style:italic'>no value</span>]";
const UNKNOWN_HTML: &str = "[<span style='font-style:italic'>unknown</span>]";
const UNSET_HTML: &str = "[<span style='font-style:italic'>unset</span>]";

/// Text and HTML bodies of one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub html: String,
}

/// Render both bodies. `fields` are `(label, value)` pairs in display order.
pub fn render_message(
    fields: &[(&str, &str)],
    referrer: &str,
    language: Option<Language>,
) -> RenderedMessage {
    RenderedMessage {
        text: render_text(fields, referrer),
        html: render_html(fields, referrer, language),
    }
}

/// Plain-text body
pub fn render_text(fields: &[(&str, &str)], referrer: &str) -> String {
    let mut text = String::from("Someone just submitted a form.\nHere's what it said:\n");

    for &(label, value) in fields {
        let value = if value.is_empty() { NO_VALUE_TEXT } else { value };
        text.push_str(&format!("\n{label}: {value}"));
    }

    let referrer = if referrer.is_empty() {
        UNKNOWN_TEXT
    } else {
        referrer
    };
    text.push_str(&format!("\n\nThis form was submitted from {referrer}."));
    text
}

/// HTML body
pub fn render_html(fields: &[(&str, &str)], referrer: &str, language: Option<Language>) -> String {
    let blocks: String = fields
        .iter()
        .map(|(label, value)| {
            field_block(&Html::escape(label), &Html::escape_or(value, NO_VALUE_HTML)).0
        })
        .collect();

    let referrer = Html::escape_or(referrer, UNKNOWN_HTML);
    let language = match language {
        Some(language) => Html::escape(language.label()),
        None => Html::trusted(UNSET_HTML),
    };

    format!(
        "{head}{blocks}{footer}",
        head = DOCUMENT_HEAD,
        footer = footer(&referrer, &language),
    )
}

/// One labelled card: label as heading, value as body
pub fn field_block(label: &Html, value: &Html) -> Html {
    Html(format!(
        r#"
             <tr style="border-collapse:collapse">
              <td align="left" style="padding:0;Margin:0;padding-top:20px;padding-left:20px;padding-right:20px">
               <table cellpadding="0" cellspacing="0" width="100%" role="presentation" style="mso-table-lspace:0pt;mso-table-rspace:0pt;border-collapse:collapse;border-spacing:0px;table-layout:fixed;width:100%;font-family:'Helvetica Neue', Helvetica, Arial, Verdana, sans-serif;font-weight:300;box-shadow:0 0.2em 0.3em #777777;border-radius:0.2em">
                <tbody style="border-radius:inherit">
                 <tr style="border-collapse:collapse;border-bottom:3px solid #0288D1">
                  <td style="padding:0.2em 0.5em;Margin:0;background-color:#EEEEEE"><h2 style="Margin:0;line-height:120%;mso-line-height-rule:exactly;font-family:inherit;font-size:1.2rem;font-style:normal;font-weight:400;color:#333333">{label}</h2></td>
                 </tr>
                 <tr style="border-collapse:collapse">
                  <td style="padding:0.2em 0.5em;Margin:0"><p style="Margin:0;-webkit-text-size-adjust:none;-ms-text-size-adjust:none;mso-line-height-rule:exactly;font-size:14px;font-family:inherit;line-height:21px;color:#333333;font-weight:inherit">{value}</p></td>
                 </tr>
                </tbody>
               </table></td>
             </tr>"#
    ))
}

fn footer(referrer: &Html, language: &Html) -> String {
    format!(
        r#"
             <tr style="border-collapse:collapse">
              <td align="center" style="padding:20px;Margin:0"><span style="text-align:center;font-family:'Helvetica Neue', Helvetica, Arial, Verdana, sans-serif;font-weight:300;font-size:0.8rem">This form was submitted from {referrer} (Language: {language}).</span></td>
             </tr>
           </table></td>
         </tr>
       </table></td>
     </tr>
   </table>
  </div>
 </body>
</html>"#
    )
}

/// Document preamble through the heading row. Table layout, inline styles
/// and the Outlook conditional blocks keep desktop clients rendering it.
const DOCUMENT_HEAD: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:o="urn:schemas-microsoft-com:office:office" style="width:100%;font-family:arial, 'helvetica neue', helvetica, sans-serif;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%;padding:0;Margin:0">
 <head>
  <meta charset="UTF-8">
  <meta content="width=device-width, initial-scale=1" name="viewport">
  <meta name="x-apple-disable-message-reformatting">
  <meta http-equiv="X-UA-Compatible" content="IE=edge">
  <meta content="telephone=no" name="format-detection">
  <title>New form submission</title>
  <!--[if gte mso 9]>
<xml>
    <o:OfficeDocumentSettings>
    <o:AllowPNG></o:AllowPNG>
    <o:PixelsPerInch>96</o:PixelsPerInch>
    </o:OfficeDocumentSettings>
</xml>
<![endif]-->
  <style type="text/css">
#outlook a { padding:0; }
.ExternalClass { width:100%; }
.ExternalClass, .ExternalClass p, .ExternalClass span, .ExternalClass font, .ExternalClass td, .ExternalClass div { line-height:100%; }
a[x-apple-data-detectors] { color:inherit!important; text-decoration:none!important; font-size:inherit!important; font-family:inherit!important; font-weight:inherit!important; line-height:inherit!important; }
@media only screen and (max-width:600px) { p { font-size:16px!important; line-height:150%!important } h1 { font-size:30px!important; text-align:center; line-height:120%!important } h2 { font-size:26px!important; text-align:center; line-height:120%!important } .es-content table, .es-content { width:100%!important; max-width:600px!important } }
</style>
 </head>
 <body style="width:100%;font-family:arial, 'helvetica neue', helvetica, sans-serif;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%;padding:0;Margin:0">
  <div class="es-wrapper-color" style="background-color:#F6F6F6">
   <!--[if gte mso 9]>
			<v:background xmlns:v="urn:schemas-microsoft-com:vml" fill="t">
				<v:fill type="tile" color="#f6f6f6"></v:fill>
			</v:background>
		<![endif]-->
   <table class="es-wrapper" width="100%" cellspacing="0" cellpadding="0" style="mso-table-lspace:0pt;mso-table-rspace:0pt;border-collapse:collapse;border-spacing:0px;padding:0;Margin:0;width:100%;height:100%">
     <tr style="border-collapse:collapse">
      <td valign="top" style="padding:0;Margin:0">
       <table class="es-content" cellspacing="0" cellpadding="0" align="center" style="mso-table-lspace:0pt;mso-table-rspace:0pt;border-collapse:collapse;border-spacing:0px;table-layout:fixed !important;width:100%">
         <tr style="border-collapse:collapse">
          <td align="center" style="padding:0;Margin:0">
           <table class="es-content-body" cellspacing="0" cellpadding="0" bgcolor="#ffffff" align="center" style="mso-table-lspace:0pt;mso-table-rspace:0pt;border-collapse:collapse;border-spacing:0px;background-color:#FFFFFF;width:600px">
             <tr style="border-collapse:collapse">
              <td align="center" style="padding:0;Margin:0;padding-top:20px;padding-left:20px;padding-right:20px">
               <h1 style="Margin:0;line-height:120%;mso-line-height-rule:exactly;font-family:'Helvetica Neue', Helvetica, Arial, Verdana, sans-serif;font-size:1.7rem;font-style:normal;font-weight:300;color:#333333;text-align:center;margin-bottom:0.2rem">Someone just submitted a form</h1>
               <h2 style="Margin:0;line-height:120%;mso-line-height-rule:exactly;font-family:'Helvetica Neue', Helvetica, Arial, Verdana, sans-serif;font-size:1.1rem;font-style:normal;font-weight:400;text-align:center;color:#01579B">Here's what it said</h2>
              </td>
             </tr>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIELDS: [(&str, &str); 2] = [("Name", "Ada Lovelace"), ("Email", "ada@example.com")];

    #[test]
    fn test_text_body_layout() {
        let text = render_text(&FIELDS, "https://example.org/signup");
        assert_eq!(
            text,
            "Someone just submitted a form.\nHere's what it said:\n\
             \nName: Ada Lovelace\
             \nEmail: ada@example.com\
             \n\nThis form was submitted from https://example.org/signup."
        );
    }

    #[test]
    fn test_text_body_placeholders() {
        let text = render_text(&[("Name", ""), ("Email", "")], "");
        assert!(text.contains("\nName: [no value]"));
        assert!(text.contains("\nEmail: [no value]"));
        assert!(text.ends_with("This form was submitted from [unknown]."));
    }

    #[test]
    fn test_html_escapes_values() {
        let html = render_html(
            &[("Name", "<script>alert('x')</script>"), ("Email", "a&b@example.com")],
            "https://example.org/?a=1&b=<2>",
            None,
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(html.contains("a&amp;b@example.com"));
        assert!(html.contains("https://example.org/?a=1&amp;b=&lt;2&gt;"));
    }

    #[test]
    fn test_html_placeholders_and_language() {
        let html = render_html(&[("Name", "")], "", None);
        assert!(html.contains(NO_VALUE_HTML));
        assert!(html.contains(&format!("submitted from {UNKNOWN_HTML} (Language: {UNSET_HTML})")));

        let html = render_html(&FIELDS, "https://example.org", Some(Language::Spanish));
        assert!(html.contains("(Language: Spanish)"));
        assert!(!html.contains(NO_VALUE_HTML));
    }

    #[test]
    fn test_one_block_per_field_in_order() {
        let html = render_html(&FIELDS, "", Some(Language::English));
        let name_at = html.find(">Name</h2>").unwrap();
        let email_at = html.find(">Email</h2>").unwrap();
        assert!(name_at < email_at);
        assert_eq!(html.matches("border-bottom:3px solid #0288D1").count(), 2);
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let first = render_message(&FIELDS, "https://example.org", Some(Language::English));
        let second = render_message(&FIELDS, "https://example.org", Some(Language::English));
        assert_eq!(first, second);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html("\"q\" 'q'"), "&quot;q&quot; &#x27;q&#x27;");
    }
}
