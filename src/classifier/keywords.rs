// Built-in stock phrasing, matched as lower-case substrings of visible text.
// Out-of-stock phrases include negated forms of in-stock phrases ("not in
// stock", "nicht auf lager") and restock-alert wording ("email me when back
// in stock", "wieder auf lager"); they only classify correctly when checked
// before the in-stock list.

pub const DEFAULT_OUT_OF_STOCK: &[&str] = &[
    // English
    "out of stock",
    "sold out",
    "currently unavailable",
    "temporarily unavailable",
    "not available",
    "not in stock",
    "no longer available",
    "notify me when available",
    "email me when available",
    "back in stock",
    "notify me when",
    "email me when",
    "let me know when",
    "unavailable",
    // Turkish
    "stokta yok",
    "tükendi",
    "stokta bulunmuyor",
    "satışta değil",
    "gelince haber ver",
    "stokta olunca",
    "stoğa girince",
    "tekrar stokta",
    // German
    "ausverkauft",
    "nicht verfügbar",
    "nicht auf lager",
    "derzeit nicht lieferbar",
    "nicht lieferbar",
    "wieder auf lager",
    "wieder verfügbar",
    "wieder lieferbar",
    // French
    "rupture de stock",
    "épuisé",
    "indisponible",
    "victime de son succès",
    "de nouveau en stock",
    "à nouveau en stock",
    "de retour en stock",
    "me prévenir",
    // Spanish
    "agotado",
    "sin stock",
    "no disponible",
    "fuera de stock",
    "de nuevo en stock",
    "vuelva a estar disponible",
    "avísame",
    // Italian
    "esaurito",
    "non disponibile",
    "non più disponibile",
    "di nuovo disponibile",
    "torna disponibile",
    "avvisami",
    // Dutch
    "uitverkocht",
    "niet op voorraad",
    "niet beschikbaar",
    "tijdelijk niet leverbaar",
    "weer op voorraad",
    "weer leverbaar",
    "weer beschikbaar",
];

pub const DEFAULT_IN_STOCK: &[&str] = &[
    // English
    "add to cart",
    "add to bag",
    "add to basket",
    "buy now",
    "buy it now",
    "in stock",
    "available now",
    // Turkish
    "sepete ekle",
    "stokta var",
    "hemen al",
    "satın al",
    // German
    "in den warenkorb",
    "auf lager",
    "sofort lieferbar",
    "jetzt kaufen",
    // French
    "ajouter au panier",
    "en stock",
    "acheter maintenant",
    // Spanish
    "añadir al carrito",
    "añadir a la cesta",
    "comprar ahora",
    // Italian
    "aggiungi al carrello",
    "acquista ora",
    "disponibilità immediata",
    // Dutch
    "in winkelwagen",
    "op voorraad",
    "nu kopen",
];
