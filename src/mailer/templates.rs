//! HTML bodies of the customer e-mails.

use crate::{
    domain::ReceiptKind,
    mailer::OutgoingEmail,
    services::checkout::CheckoutReceipt,
};

const STYLE: &str = "body{font-family:Arial,sans-serif;line-height:1.6;color:#333;\
max-width:600px;margin:0 auto;padding:20px}\
.header{background:#8b4513;color:#fff;padding:24px;text-align:center;border-radius:8px 8px 0 0}\
.content{background:#fdf8f3;padding:24px;border-radius:0 0 8px 8px}\
table{width:100%;border-collapse:collapse}\
th,td{padding:8px;border-bottom:1px solid #e5d5c5;text-align:left}\
.total{font-weight:bold;font-size:1.1em}\
.footer{color:#888;font-size:12px;text-align:center;margin-top:24px}";

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str, recipient: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><style>{STYLE}</style></head>\
<body><div class=\"header\"><h1>{title}</h1></div><div class=\"content\">{body}</div>\
<div class=\"footer\">Este correo fue enviado a {recipient}<br>Raíces - Restaurante</div>\
</body></html>",
        recipient = escape(recipient),
    )
}

pub fn welcome(to: &str, full_name: &str) -> OutgoingEmail {
    let body = format!(
        "<p><strong>¡Hola {}!</strong></p>\
<p>Tu cuenta en Raíces fue creada con éxito. Ya puedes explorar nuestra carta, \
armar tu carrito y hacer tus pedidos en línea.</p>",
        escape(full_name)
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: "¡Bienvenido a Raíces! 🎉".into(),
        html: layout("¡Bienvenido a Raíces!", &body, to),
    }
}

pub fn order_confirmation(receipt: &CheckoutReceipt) -> OutgoingEmail {
    let rows: String = receipt
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>S/ {:.2}</td><td>S/ {:.2}</td></tr>",
                escape(&item.nombre),
                item.cantidad,
                item.precio_unitario,
                item.precio_unitario * rust_decimal::Decimal::from(item.cantidad),
            )
        })
        .collect();

    let kind = match receipt.tipo_comprobante {
        ReceiptKind::Boleta => "Boleta",
        ReceiptKind::Factura => "Factura",
    };
    let ruc = receipt
        .ruc
        .as_deref()
        .map(|ruc| format!("<p>RUC: {}</p>", escape(ruc)))
        .unwrap_or_default();

    let body = format!(
        "<p><strong>¡Hola {name}!</strong></p>\
<p>Tu pedido <strong>#{order}</strong> fue confirmado.</p>\
<p>{kind}: <strong>{number}</strong></p>{ruc}\
<table><thead><tr><th>Producto</th><th>Cantidad</th><th>Precio</th><th>Subtotal</th></tr></thead>\
<tbody>{rows}</tbody></table>\
<p>Subtotal: S/ {subtotal:.2}<br>IGV (18%): S/ {tax:.2}</p>\
<p class=\"total\">Total: S/ {total:.2}</p>",
        name = escape(&receipt.customer_name),
        order = receipt.orden_id,
        number = escape(&receipt.numero_comprobante),
        subtotal = receipt.totals.subtotal,
        tax = receipt.totals.tax,
        total = receipt.totals.total,
    );

    OutgoingEmail {
        to: receipt.customer_email.clone(),
        subject: format!("Pedido Confirmado #{} - Raíces 🎉", receipt.orden_id),
        html: layout("¡Pedido confirmado!", &body, &receipt.customer_email),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        domain::{OrderTotals, ProductKind},
        services::checkout::PurchasedItem,
    };

    #[test]
    fn names_are_escaped() {
        let email = welcome("ana@raices.test", "<script>Ana</script>");

        assert!(email.html.contains("&lt;script&gt;Ana&lt;/script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn confirmation_lists_items_and_totals() {
        let receipt = CheckoutReceipt {
            orden_id: 42,
            numero_comprobante: "F00000042".into(),
            tipo_comprobante: ReceiptKind::Factura,
            ruc: Some("20123456789".into()),
            totals: OrderTotals::from_lines([
                (2, Decimal::new(1500, 2)),
                (1, Decimal::new(800, 2)),
            ])
            .unwrap()
            .rounded(),
            customer_name: "Ana Quispe".into(),
            customer_email: "ana@raices.test".into(),
            items: vec![PurchasedItem {
                nombre: "Lomo saltado".into(),
                cantidad: 2,
                precio_unitario: Decimal::new(1500, 2),
                producto_tipo: ProductKind::Comida,
            }],
        };

        let email = order_confirmation(&receipt);

        assert_eq!(email.to, "ana@raices.test");
        assert_eq!(email.subject, "Pedido Confirmado #42 - Raíces 🎉");
        assert!(email.html.contains("Lomo saltado"));
        assert!(email.html.contains("S/ 30.00"));
        assert!(email.html.contains("RUC: 20123456789"));
        assert!(email.html.contains("Total: S/ 44.84"));
    }
}
